use color_eyre::Result;
use std::sync::{Arc, RwLock};

mod adapters;
mod application;
mod domain;
mod ports;

use adapters::{
    api::{ApiAuthRepository, ApiClient, ApiClientRepository, ApiProjectRepository},
    cache::MokaCacheAdapter,
    cli::{build_cli, CliContext},
    config::FileConfigStore,
    tui::{run_tui, PreviewSettings, WizardApp},
};
use application::{
    AppError, ClientService, ProjectService, SessionContext, SubmissionGateway, SubmissionKind,
};
use domain::ProjectId;
use ports::ConfigStore;

const API_URL_ENV: &str = "CREATOR_DESK_API_URL";

fn fail(e: AppError) -> ! {
    match &e {
        AppError::Validation(errors) => {
            eprintln!("❌ Please fix the following:");
            for (field, message) in errors.iter() {
                eprintln!("   {field}: {message}");
            }
        }
        AppError::Repository(repo) => eprintln!("❌ {}", repo.user_message()),
        AppError::AuthenticationRequired => {
            eprintln!("❌ Not signed in");
            eprintln!();
            eprintln!("Run: creator-desk login --email you@example.com");
        }
        _ => eprintln!("❌ {e}"),
    }
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize color-eyre for better error reporting
    color_eyre::install()?;

    let matches = build_cli().get_matches();

    // Log to a file, the terminal belongs to the wizard
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("creator-desk.log")?;

    let level = if matches.get_flag("verbose") {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_max_level(level)
        .init();

    // Load configuration
    let config_store = Arc::new(FileConfigStore::new()?);
    let mut config = config_store.load_config().await?;

    // Override with command line arguments or environment variables
    if let Some(url) = matches.get_one::<String>("api_url") {
        config.api_base_url = url.clone();
    } else if let Ok(url) = std::env::var(API_URL_ENV) {
        if !url.trim().is_empty() {
            config.api_base_url = url;
        }
    }
    tracing::debug!(api = %config.api_base_url, "configuration loaded");

    // Create dependencies
    let token = Arc::new(RwLock::new(None));
    let api_client = ApiClient::new(&config.api_base_url, token)?;
    let project_repo = Arc::new(ApiProjectRepository::new(api_client.clone()));
    let client_repo = Arc::new(ApiClientRepository::new(api_client.clone()));
    let auth_repo = Arc::new(ApiAuthRepository::new(api_client.clone()));

    let session = Arc::new(SessionContext::new(config_store.clone(), auth_repo));
    session.initialize().await?;
    api_client.set_token(session.token().await);

    // Create application services
    let client_cache = Arc::new(MokaCacheAdapter::for_clients(config.cache_ttl_seconds));
    let projects = Arc::new(ProjectService::new(
        project_repo.clone(),
        config.cache_ttl_seconds,
    ));
    let clients = Arc::new(ClientService::new(
        client_repo,
        client_cache,
        config.phone_policy,
    ));
    let gateway = Arc::new(SubmissionGateway::new(project_repo));

    let cli = CliContext {
        config,
        api: api_client,
        session,
        projects,
        clients,
    };

    // Handle subcommands
    let outcome = match matches.subcommand() {
        Some(("login", login)) => cli.login(login).await,
        Some(("signup", signup)) => cli.signup(signup).await,
        Some(("logout", _)) => cli.logout().await,
        Some(("whoami", _)) => cli.whoami().await,
        Some(("projects", sub)) => cli.projects(sub).await,
        Some(("clients", sub)) => cli.clients(sub).await,
        Some(("invoice", sub)) => cli.invoice(sub).await,
        Some(("wizard", wizard)) => {
            let draft_id = wizard
                .get_one::<String>("draft")
                .map(|id| ProjectId::from(id.as_str()));
            run_wizard(&cli, gateway, draft_id).await
        }
        // Default behavior - run the wizard
        None => run_wizard(&cli, gateway, None).await,
        _ => Err(AppError::Application("Unknown command".to_string())),
    };

    if let Err(e) = outcome {
        fail(e);
    }

    Ok(())
}

async fn run_wizard(
    cli: &CliContext,
    gateway: Arc<SubmissionGateway>,
    draft_id: Option<ProjectId>,
) -> application::AppResult<()> {
    let user = cli.signed_in_user().await?;
    let projects = &cli.projects;
    let config = &cli.config;

    let draft = match draft_id {
        Some(id) => Some(projects.get_draft(&id, &user.id).await?.draft),
        None => None,
    };

    let settings = PreviewSettings {
        project_tax_rate: config.project_tax_rate,
        financing_fee_percent: config.financing_fee_percent,
    };
    let app = WizardApp::new(gateway, user.id, settings, draft);

    let receipt = run_tui(app)
        .await
        .map_err(|e| AppError::Application(format!("Terminal error: {e}")))?;

    match receipt {
        Some(receipt) => {
            projects.invalidate_lists();
            let name = &receipt.project.draft.project_name;
            let id = match receipt.project.id.0.as_str() {
                "" => String::new(),
                id => format!(" ({id})"),
            };
            match receipt.kind {
                SubmissionKind::Draft => println!("✅ Draft \"{name}\" saved{id}"),
                SubmissionKind::Final => println!("✅ Project \"{name}\" created{id}"),
            }
        }
        None => println!("Wizard closed without saving"),
    }
    Ok(())
}
