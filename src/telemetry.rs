use prometheus::register_counter_vec;
use prometheus::CounterVec;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use lazy_static::lazy_static;

lazy_static! {
    pub static ref QUESTIONS_SERVED_CNTR: CounterVec = register_counter_vec!(
        "questions_served_total",
        "Number of questions returned by lookups",
        &["query"]
    )
    .unwrap();
    // labelled by stored category, so series count grows with the number of categories
    pub static ref QUIZ_ANSWERS_CNTR: CounterVec = register_counter_vec!(
        "quiz_answers_total",
        "Number of scored quiz answers",
        &["category", "result"]
    )
    .unwrap();
}

pub fn init_tracing() {
    let mut fmt_layer = fmt::layer();
    if std::env::var("INCLUDE_SPAN_EVENTS").is_ok_and(|value| value.eq_ignore_ascii_case("true")) {
        fmt_layer = fmt_layer.with_span_events(FmtSpan::ENTER | FmtSpan::EXIT);
    }
    let filter_layer = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
