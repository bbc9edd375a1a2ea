use std::{process, sync::Arc};

use microblog::{
    application::{
        error::AppError,
        posts::PostService,
        probes::ProbeService,
        repos::CreateUserParams,
        users::{UserService, register_user},
    },
    cache::{self, CacheConfig, CacheKeys, PostCache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        host,
        http::{self, ApiState},
        telemetry,
    },
};
use tokio::sync::watch;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
        config::Command::CreateUser(args) => run_create_user(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;

    let cache_config = CacheConfig::from(&settings.cache);
    let backend = cache::build_backend(&cache_config)?;
    cache::self_check(
        backend.as_ref(),
        &CacheKeys::new(cache_config.key_prefix.clone()),
        cache_config.backend_name(),
    )
    .await;

    let post_cache = PostCache::new(backend.clone(), &cache_config);
    let state = ApiState {
        posts: Arc::new(PostService::new(
            repositories.clone(),
            repositories.clone(),
            repositories.clone(),
            post_cache,
        )),
        users: Arc::new(UserService::new(repositories.clone())),
        probes: Arc::new(ProbeService::new(
            repositories.clone(),
            repositories.clone(),
            repositories,
            backend,
            host::default_probe(),
            settings.health.version.clone(),
        )),
    };

    serve_http(&settings, state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    init_repositories(&settings).await?;
    info!(target = "microblog::migrate", "Migrations are up to date");
    Ok(())
}

async fn run_create_user(
    settings: config::Settings,
    args: config::CreateUserArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let user = register_user(
        repositories.as_ref(),
        CreateUserParams {
            username: args.username,
            email: args.email,
            about_me: args.about_me,
        },
    )
    .await?;

    info!(
        target = "microblog::create_user",
        user_id = user.id,
        username = %user.username,
        "Created user"
    );
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or(InfraError::NotConfigured {
            key: "database.url",
        })?;

    let pool = PostgresRepositories::connect(
        database_url,
        settings.database.max_connections.get(),
        settings.database.acquire_timeout,
    )
    .await
    .map_err(InfraError::Connect)?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        target = "microblog::serve",
        addr = %settings.server.addr,
        "Listening"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let mut graceful_rx = shutdown_rx.clone();
    let graceful = async move {
        let _ = graceful_rx.wait_for(|stopping| *stopping).await;
    };
    let grace = settings.server.graceful_shutdown;
    let mut deadline_rx = shutdown_rx;
    let deadline = async move {
        let _ = deadline_rx.wait_for(|stopping| *stopping).await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = http::serve(listener, router, graceful) => result.map_err(AppError::from)?,
        () = deadline => {
            warn!(
                target = "microblog::serve",
                grace_seconds = grace.as_secs(),
                "Graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "microblog::serve", "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!(target = "microblog::serve", "Shutdown signal received");
}

