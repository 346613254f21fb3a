pub mod diagram;
pub mod dot;
pub mod html;
pub mod json;
pub mod markdown;
pub mod text;
