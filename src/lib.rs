//! cfn-tools - CloudFormation YAML templates with intrinsic function tags
//!
//! Loads templates written with short-form intrinsic functions (`!Ref`,
//! `!GetAtt`, `!Sub`, ...) into an ordered tree, evaluates the `!IncludeFile`
//! and `!ToString` processing tags while loading, and writes the result back
//! as YAML or as CloudFormation JSON.

pub mod cfn_yaml;
pub mod processing;

pub use cfn_yaml::{
    dump, load, load_file, parse_yaml_to_json, to_json, DumpOptions, Error, Result, Template,
    Value,
};
