//! satprep-report: rendering of score reports for people.

pub mod html;

pub use html::{generate_html, write_html_report};
