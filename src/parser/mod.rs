mod ebnf;

pub(crate) use ebnf::parse_json;
