pub mod admin_dto;
pub mod quiz_dto;
pub mod record_dto;
