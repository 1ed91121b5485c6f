// Web front-end
// One page: the document checklist, a question form and the latest answer


pub mod page;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::documents::document_status;
use crate::rag::RagPipeline;
use crate::{RagError, Result};
use page::{Outcome, PageView, markdown_to_html, render, MISSING_FILE_HINT};

/// Shared state behind every request
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    pipeline: Arc<RagPipeline>,
    answering: Arc<AtomicBool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuestionForm {
    #[serde(default)]
    pub question: String,
}

/// Marks the page as Answering until dropped
struct AnsweringGuard<'a>(&'a AtomicBool);

impl<'a> AnsweringGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for AnsweringGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AppState {
    #[inline]
    pub fn new(config: Arc<Config>, pipeline: Arc<RagPipeline>) -> Self {
        Self {
            config,
            pipeline,
            answering: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True while a question is being answered
    #[inline]
    pub fn is_answering(&self) -> bool {
        self.answering.load(Ordering::Acquire)
    }

    fn page(&self, question: &str, outcome: Outcome) -> Html<String> {
        let documents = document_status(&self.config.pdf_files());
        Html(render(&PageView {
            documents: &documents,
            question,
            outcome,
        }))
    }
}

#[inline]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(ask))
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    state.page("", Outcome::Idle)
}

async fn ask(State(state): State<AppState>, Form(form): Form<QuestionForm>) -> Response {
    let question = form.question.trim();
    if question.is_empty() {
        return state.page("", Outcome::Idle).into_response();
    }

    let Some(_guard) = AnsweringGuard::acquire(&state.answering) else {
        warn!("Rejected question while another one is being answered");
        return (StatusCode::CONFLICT, state.page(question, Outcome::Busy)).into_response();
    };

    let outcome = match state.pipeline.answer(question).await {
        Ok(answer) => {
            info!(
                "Answered question with {} context chunks",
                answer.context.len()
            );
            Outcome::Answer(markdown_to_html(&answer.text))
        }
        Err(e) => {
            error!("Failed to answer question: {}", e);
            let hint = matches!(e, RagError::MissingFile { .. }).then_some(MISSING_FILE_HINT);
            Outcome::Error {
                message: e.to_string(),
                hint,
            }
        }
    };

    state.page(question, outcome).into_response()
}

/// Serve the page until Ctrl+C
#[inline]
pub async fn serve(config: Arc<Config>, pipeline: Arc<RagPipeline>) -> Result<()> {
    let addr = config
        .server
        .socket_addr()
        .map_err(|e| RagError::Config(e.to_string()))?;

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(AppState::new(config, pipeline)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}
