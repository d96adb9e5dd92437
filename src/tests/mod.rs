pub mod common;

mod resolve_and_issue;
