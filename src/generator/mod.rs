pub mod html2text;
pub mod md2html;
mod nesting;
