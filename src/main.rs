use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use news_quiz::{
    api::{AppState, create_router},
    config::Config,
    llm_providers::{LLMProviderFactory, TextGenerator},
    logging::setup_logging,
    news_fetcher::NewsApiClient,
    quiz_generator::QuizGenerator,
    session::QuizService,
    session_store::SessionStore,
    summarizer::LlmSummarizer,
};
use news_quiz::log_system_event;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let _guard = setup_logging(&config.logging)?;

    config.validate()?;
    config.log_configuration_summary();

    log_system_event!(startup, component = "server", "Starting News Quiz server");

    let generator: Arc<dyn TextGenerator> = Arc::new(LLMProviderFactory::create_provider(
        config.llm.provider,
        config.llm.api_key.clone(),
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm.timeout(),
        config.llm.max_output_tokens,
    ));
    info!(
        provider = generator.provider_name(),
        model = generator.model_name(),
        "Initialized LLM provider"
    );

    let news = NewsApiClient::new(
        config.news.api_key.clone(),
        config.news.base_url.clone(),
        config.llm.timeout(),
    );
    let summarizer = LlmSummarizer::new(generator.clone(), config.quiz.summary_max_input_chars);
    let quiz_generator = QuizGenerator::new(generator, config.quiz.questions_per_summary);

    let state = AppState {
        quiz_service: QuizService::new(
            Arc::new(news),
            Arc::new(summarizer),
            quiz_generator,
            config.news.default_query.clone(),
        ),
        sessions: SessionStore::new(config.sessions.max_sessions, config.sessions.ttl_minutes),
    };

    tokio::spawn(expire_sessions(state.sessions.clone()));

    let app = create_router(state).layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let addr = config.server.address();
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_system_event!(shutdown, component = "server", "Server stopped");
    Ok(())
}

/// Periodically drop sessions that have been idle past their TTL
async fn expire_sessions(sessions: SessionStore) {
    let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
    loop {
        interval.tick().await;
        sessions.cleanup().await;
        let stats = sessions.get_stats().await;
        debug!(
            active_sessions = stats.active_sessions,
            max_sessions = stats.max_sessions,
            "Session store status"
        );
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
