use async_trait::async_trait;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use gatehouse::config::AppConfig;
use gatehouse::error::AppError;
use gatehouse::telemetry;
use gatehouse::workflows::membership::{
    membership_router, ApplicantId, ControlInteraction, DecisionEvent, FileLedgerStore,
    LedgerError, LogNotifier, Member, MemberListing, MembershipApplication, MembershipError,
    MembershipService, MembershipSettings, MemoryLedgerStore, NotificationError,
    NotificationGateway, PageLimits, ReactionEvent, Resolution, StaticDirectory,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Membership Gatehouse",
    about = "Run and demo the membership gatehouse service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk the application review workflow against an in-memory directory
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// Submissions each applicant may file before the quota refuses more
    #[arg(long, default_value_t = 2)]
    quota: usize,
    /// Form entries per review page
    #[arg(long, default_value_t = 4)]
    page_capacity: usize,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let directory = Arc::new(StaticDirectory::default());
    let notifier = Arc::new(LogNotifier);
    let store = FileLedgerStore::new(config.ledger_path.clone());
    let service = Arc::new(MembershipService::open(
        directory,
        notifier,
        store,
        config.membership.clone(),
    )?);
    info!("using built-in static directory and log notifier");

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let ops = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state);

    let app = ops
        .merge(membership_router(service, &config.shared_secret))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "membership gatehouse ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Demo notifier printing deliveries to stdout so the transcript reads as one
/// piece.
struct PrintNotifier;

#[async_trait]
impl NotificationGateway for PrintNotifier {
    async fn send_direct_message(
        &self,
        member: &Member,
        text: &str,
    ) -> Result<(), NotificationError> {
        println!("  [dm to {}] {text}", member.username);
        Ok(())
    }
}

async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let settings = MembershipSettings {
        submission_quota: args.quota,
        page_limits: PageLimits::new(args.page_capacity, 1024),
        ..MembershipSettings::default()
    };

    let directory = StaticDirectory::default()
        .with_member("42", "Mara", &[])
        .with_member("77", "Quinn", &[settings.whitelist_role.clone()]);
    let service = MembershipService::open(
        Arc::new(directory.clone()),
        Arc::new(PrintNotifier),
        MemoryLedgerStore::default(),
        settings.clone(),
    )?;

    println!("Membership gatehouse demo");
    println!(
        "Quota: {} submissions, {} form entries per page",
        args.quota, args.page_capacity
    );

    println!("\nWhitelist checks");
    for id in ["42", "77", "999"] {
        let status = service.check_status(&ApplicantId(id.to_string())).await?;
        println!("- {id}: {}", status.label());
    }

    println!("\nApplication submitted");
    let applicant = ApplicantId("42".to_string());
    let count = service
        .submit_application(demo_application(&applicant))
        .await?;
    println!("- submission {count} recorded for applicant 42");

    let reviews = directory.posted_reviews();
    if let Some((channel, artifact)) = reviews.last() {
        println!("- posted to {}: {}", channel.0, artifact.summary);
        for page in &artifact.pages {
            let names: Vec<&str> = page
                .fields
                .iter()
                .map(|field| field.name.as_str())
                .collect();
            println!(
                "  page {}/{}: {}",
                page.number,
                page.total,
                names.join(", ")
            );
        }
        for control in artifact.controls.iter() {
            println!("  control [{}] id {}", control.label(), control.control_id());
        }

        println!("\nReviewer decision (control click)");
        let interaction = ControlInteraction {
            control_id: artifact.controls[0].control_id(),
            reviewer_id: "7".to_string(),
        };
        if let Some(event) = interaction.decision_event() {
            match service.resolve_decision(&event).await? {
                Resolution::Applied { outcome } => {
                    println!("- reviewer 7 applied '{}'", outcome.as_str())
                }
                Resolution::AlreadyResolved { standing } => {
                    println!("- ignored, applicant already {}", standing.label())
                }
            }
        }
        print_roles(&directory, &applicant, &settings);

        println!("\nDuplicate decision (reaction)");
        let reaction = ReactionEvent {
            emoji: settings.reactions.reject.clone(),
            message_summary: artifact.summary.clone(),
            reviewer_id: "8".to_string(),
        };
        if let Some(event) = reaction.decision_event(&settings.reactions) {
            match service.resolve_decision(&event).await? {
                Resolution::Applied { outcome } => {
                    println!("- reviewer 8 applied '{}'", outcome.as_str())
                }
                Resolution::AlreadyResolved { standing } => {
                    println!("- ignored, applicant already {}", standing.label())
                }
            }
        }
        print_roles(&directory, &applicant, &settings);
    }

    println!("\nAdministrative override");
    let override_event = DecisionEvent {
        applicant_id: applicant.clone(),
        outcome: "reject".to_string(),
        reviewer_id: "ops-admin".to_string(),
    };
    let outcome = service.admin_decide(&override_event).await?;
    println!("- ops-admin forced '{}'", outcome.as_str());
    print_roles(&directory, &applicant, &settings);

    println!("\nQuota exhaustion");
    loop {
        match service.submit_application(demo_application(&applicant)).await {
            Ok(count) => println!("- submission {count} recorded"),
            Err(MembershipError::Ledger(LedgerError::QuotaExceeded { limit })) => {
                println!("- refused: submission quota of {limit} reached");
                break;
            }
            Err(other) => return Err(AppError::from(other)),
        }
    }

    println!("\nDirectory roster");
    for MemberListing {
        id,
        username,
        roles,
    } in service.member_roster().await?
    {
        let roles: Vec<String> = roles.into_iter().map(|role| role.0).collect();
        println!("- {} ({}): [{}]", username, id.0, roles.join(", "));
    }

    Ok(())
}

fn demo_application(applicant: &ApplicantId) -> MembershipApplication {
    let form = [
        ("name", "Mara Voss"),
        ("age", "29"),
        ("location", "Gdansk"),
        ("experience", "Two seasons of moderation work"),
        ("motivation", "Keep the community welcoming"),
        ("referral", ""),
        ("availability", "Evenings CET"),
        ("languages", "Polish, English"),
        ("rules_ack", "yes"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect();

    MembershipApplication {
        applicant_id: applicant.clone(),
        username: "Mara".to_string(),
        form,
    }
}

fn print_roles(directory: &StaticDirectory, id: &ApplicantId, settings: &MembershipSettings) {
    let whitelisted = directory.holds_role(id, &settings.whitelist_role);
    let rejected = directory.holds_role(id, &settings.rejected_role);
    println!("  roles: whitelisted={whitelisted} rejected={rejected}");
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
