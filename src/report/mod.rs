pub mod chart;
pub mod html;
pub mod listing;
pub mod pdf;
pub mod summary_txt;
pub mod table_txt;
pub mod zip;
