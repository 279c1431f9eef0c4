use serde::{Deserialize, Serialize};

/// Rendered value for a form entry whose submitted value was empty.
pub const EMPTY_VALUE_PLACEHOLDER: &str = "No data";

const DEFAULT_PAGE_CAPACITY: usize = 25;
const DEFAULT_VALUE_LIMIT: usize = 1024;

/// Single rendered entry on a review page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

/// Bounds applied while paginating a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    page_capacity: usize,
    value_limit: usize,
}

impl PageLimits {
    /// Build limits, replacing zero bounds with the defaults.
    pub fn new(page_capacity: usize, value_limit: usize) -> Self {
        let page_capacity = if page_capacity == 0 {
            DEFAULT_PAGE_CAPACITY
        } else {
            page_capacity
        };
        let value_limit = if value_limit == 0 {
            DEFAULT_VALUE_LIMIT
        } else {
            value_limit
        };

        Self {
            page_capacity,
            value_limit,
        }
    }

    pub fn page_capacity(&self) -> usize {
        self.page_capacity
    }

    pub fn value_limit(&self) -> usize {
        self.value_limit
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_CAPACITY, DEFAULT_VALUE_LIMIT)
    }
}

/// Split form entries, in their original order, into consecutive groups of at
/// most `page_capacity` entries.
///
/// Values longer than `value_limit` characters are cut at the limit; empty
/// values render as [`EMPTY_VALUE_PLACEHOLDER`]. Every submitted entry lands
/// on exactly one page, so concatenating the pages reproduces the form. An
/// empty form yields no pages at all.
pub fn paginate(form: Vec<(String, String)>, limits: &PageLimits) -> Vec<Vec<FormField>> {
    let mut pages = Vec::new();
    let mut current: Vec<FormField> = Vec::new();

    for (name, value) in form {
        current.push(FormField {
            name,
            value: render_value(value, limits.value_limit),
        });
        if current.len() == limits.page_capacity {
            pages.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        pages.push(current);
    }

    pages
}

fn render_value(value: String, limit: usize) -> String {
    if value.is_empty() {
        return EMPTY_VALUE_PLACEHOLDER.to_string();
    }

    // Cut on character boundaries so multi-byte values never split mid-glyph.
    match value.char_indices().nth(limit) {
        Some((cut, _)) => value[..cut].to_string(),
        None => value,
    }
}
