pub mod archive;
pub mod corp_codes;
pub mod markup;
