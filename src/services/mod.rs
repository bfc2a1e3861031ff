pub mod archive_service;
pub mod auth_service;
pub mod candidate_service;
pub mod completion_service;
pub mod drive_service;
pub mod evaluation_service;
pub mod export_service;
pub mod question_bank;
pub mod report_service;
pub mod session_service;
pub mod spreadsheet_service;
