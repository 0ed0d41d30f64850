pub mod artifact;
pub mod builtin_font;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod demo_feed;
pub mod dispatcher;
pub mod fonts;
pub mod http_client;
pub mod log_pane;
pub mod projection;
pub mod schedule_image;
pub mod state;
pub mod stats_fetch;
pub mod trend_chart;
