pub mod native_parser;
pub mod normalize;
