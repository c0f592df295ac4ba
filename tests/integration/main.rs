//! Integration tests for the StudyHub API and presence relay.

mod helpers;

mod api_test;
mod presence_test;
mod relay_test;
