pub mod create_exam;
pub mod digitize;
pub mod init;
pub mod validate;
