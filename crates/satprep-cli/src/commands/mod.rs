pub mod compare;
pub mod grade;
pub mod init;
pub mod list_tests;
pub mod score;
pub mod summary;
pub mod validate;
