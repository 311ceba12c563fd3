//! Integration tests for !IncludeFile and its interplay with !ToString

use cfn_tools::cfn_yaml::{self, Error, Loader, Payload, CLOUDFORMATION_TAGS};
use serde_json::json;
use tempfile::TempDir;

mod common;
use common::{write_file, OPENAPI_YAML};

fn openapi_json() -> serde_json::Value {
    json!({
        "MyStack": {
            "Def": {
                "openapi": "3.0.0",
                "info": {"title": "My API", "version": "1.0.0"}
            }
        }
    })
}

#[test]
fn test_include_yaml_file() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "openapi.yaml", OPENAPI_YAML);
    let main = write_file(
        temp.path(),
        "template.yaml",
        "MyStack:\n  Def: !IncludeFile openapi.yaml",
    );

    let template = cfn_yaml::load_file(&main).unwrap();
    assert_eq!(cfn_yaml::to_json(&template), openapi_json());
}

#[test]
fn test_include_json_file() {
    let temp = TempDir::new().unwrap();
    write_file(
        temp.path(),
        "openapi.json",
        r#"{"openapi": "3.0.0", "info": {"title": "My API", "version": "1.0.0"}}"#,
    );
    let main = write_file(
        temp.path(),
        "template.yaml",
        "MyStack:\n  Def: !IncludeFile openapi.json",
    );

    let template = cfn_yaml::load_file(&main).unwrap();
    assert_eq!(cfn_yaml::to_json(&template), openapi_json());
}

#[test]
fn test_include_text_file() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "README.txt", "Hello, World!");
    let main = write_file(
        temp.path(),
        "template.yaml",
        "MyStack:\n  Def: !IncludeFile README.txt",
    );

    let template = cfn_yaml::load_file(&main).unwrap();
    assert_eq!(
        cfn_yaml::to_json(&template),
        json!({"MyStack": {"Def": "Hello, World!"}})
    );
}

#[test]
fn test_include_relative_path() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "src/api/openapi.yaml", OPENAPI_YAML);
    let main = write_file(
        temp.path(),
        "template.yaml",
        "MyStack:\n  Def: !IncludeFile src/api/openapi.yaml",
    );

    let template = cfn_yaml::load_file(&main).unwrap();
    assert_eq!(cfn_yaml::to_json(&template), openapi_json());
}

#[test]
fn test_include_absolute_path() {
    let temp = TempDir::new().unwrap();
    let included = write_file(temp.path(), "openapi.yaml", OPENAPI_YAML);
    let main = write_file(
        temp.path(),
        "template.yaml",
        &format!("MyStack:\n  Def: !IncludeFile {}", included.display()),
    );

    let template = cfn_yaml::load_file(&main).unwrap();
    assert_eq!(cfn_yaml::to_json(&template), openapi_json());
}

#[test]
fn test_nested_include_resolves_against_included_file() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "parts/policy.json", r#"{"Effect": "Allow"}"#);
    write_file(
        temp.path(),
        "parts/role.yaml",
        "Type: AWS::IAM::Role\nPolicy: !IncludeFile policy.json\n",
    );
    let main = write_file(
        temp.path(),
        "template.yaml",
        "Resources:\n  Role: !IncludeFile parts/role.yaml\n",
    );

    let template = cfn_yaml::load_file(&main).unwrap();
    assert_eq!(
        cfn_yaml::to_json(&template),
        json!({"Resources": {"Role": {"Type": "AWS::IAM::Role", "Policy": {"Effect": "Allow"}}}})
    );
}

#[test]
fn test_included_yaml_keeps_intrinsic_tags() {
    let temp = TempDir::new().unwrap();
    write_file(
        temp.path(),
        "resources.yaml",
        "Type: AWS::S3::Bucket\nProperties:\n  BucketName: !Ref BucketNameParam\n  Tags:\n    - Key: Environment\n      Value: !Sub ${Environment}-bucket",
    );
    let main = write_file(
        temp.path(),
        "template.yaml",
        "Resources:\n  S3Bucket: !IncludeFile resources.yaml",
    );

    let template = cfn_yaml::load_file(&main).unwrap();
    let bucket = template["Resources"].get("S3Bucket").unwrap();
    assert_eq!(bucket.get("Type").unwrap().as_str(), Some("AWS::S3::Bucket"));

    let properties = bucket.get("Properties").unwrap();
    let name = properties.get("BucketName").unwrap().as_tagged().unwrap();
    assert_eq!(name.tag(), "!Ref");
    assert_eq!(name.payload(), &Payload::Scalar("BucketNameParam".into()));

    let dumped = cfn_yaml::dump(&template, &Default::default()).unwrap();
    assert!(dumped.contains("BucketName: !Ref BucketNameParam\n"));
    assert!(dumped.contains("Value: !Sub ${Environment}-bucket\n"));
}

#[test]
fn test_include_file_not_found() {
    let temp = TempDir::new().unwrap();
    let main = write_file(
        temp.path(),
        "template.yaml",
        "MyStack:\n  Def: !IncludeFile nonexistent.yaml",
    );

    let err = cfn_yaml::load_file(&main).unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
    assert!(err.to_string().contains("file not found"));
}

#[test]
fn test_error_inside_included_file_names_the_file() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "bad.yaml", "Value: !Bogus x\n");
    let main = write_file(temp.path(), "template.yaml", "Def: !IncludeFile bad.yaml\n");

    let err = cfn_yaml::load_file(&main).unwrap_err();
    assert!(matches!(err, Error::IncludeResolution { .. }));
    assert!(err.to_string().contains("bad.yaml"));
    assert!(matches!(err.root_cause(), Error::UnknownTag { .. }));
}

#[test]
fn test_invalid_json_include() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "broken.json", "{not json");
    let main = write_file(temp.path(), "template.yaml", "Def: !IncludeFile broken.json\n");

    let err = cfn_yaml::load_file(&main).unwrap_err();
    assert!(matches!(err.root_cause(), Error::Json(_)));
}

#[test]
fn test_self_include_is_a_cycle() {
    let temp = TempDir::new().unwrap();
    let main = write_file(temp.path(), "template.yaml", "Def: !IncludeFile template.yaml\n");

    let err = cfn_yaml::load_file(&main).unwrap_err();
    assert!(matches!(err, Error::IncludeCycle { .. }));
}

#[test]
fn test_indirect_include_cycle() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "a.yaml", "Next: !IncludeFile b.yaml\n");
    write_file(temp.path(), "b.yaml", "Next: !IncludeFile a.yaml\n");
    let main = write_file(temp.path(), "template.yaml", "Start: !IncludeFile a.yaml\n");

    let err = cfn_yaml::load_file(&main).unwrap_err();
    match err.root_cause() {
        Error::IncludeCycle { chain, .. } => assert_eq!(chain.len(), 4),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_same_file_included_twice_is_not_a_cycle() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "tags.yaml", "- Key: Team\n  Value: data\n");
    let main = write_file(
        temp.path(),
        "template.yaml",
        "A:\n  Tags: !IncludeFile tags.yaml\nB:\n  Tags: !IncludeFile tags.yaml\n",
    );

    let template = cfn_yaml::load_file(&main).unwrap();
    assert_eq!(template["A"], template["B"]);
}

#[test]
fn test_loader_reuse_does_not_leak_ancestors() {
    let temp = TempDir::new().unwrap();
    let shared = write_file(temp.path(), "shared.yaml", "Name: shared\n");
    let main = write_file(temp.path(), "main.yaml", "Def: !IncludeFile shared.yaml\n");

    let mut loader = Loader::new(&CLOUDFORMATION_TAGS);
    let first = loader.load_file(&shared).unwrap();
    let second = loader.load_file(&main).unwrap();
    assert_eq!(second["Def"], cfn_yaml::Value::Mapping(first));

    // A failed load leaves nothing behind either.
    write_file(temp.path(), "broken.yaml", "Def: !IncludeFile missing.yaml\n");
    assert!(loader.load_file(temp.path().join("broken.yaml")).is_err());
    assert!(loader.load_file(&main).is_ok());
}

#[test]
fn test_processed_output_reloads_identically() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "openapi.yaml", OPENAPI_YAML);
    let main = write_file(
        temp.path(),
        "template.yaml",
        "MyStack:\n  Def: !IncludeFile openapi.yaml\n  Name: !Ref AWS::StackName\n",
    );

    let template = cfn_yaml::load_file(&main).unwrap();
    let dumped = cfn_yaml::dump(&template, &Default::default()).unwrap();
    let reloaded = cfn_yaml::load(&dumped, None).unwrap();
    assert_eq!(reloaded, template);
}

#[test]
fn test_include_and_to_string() {
    let temp = TempDir::new().unwrap();
    write_file(
        temp.path(),
        "config.yaml",
        "database:\n  host: localhost\n  port: 5432\n  name: mydb",
    );
    let main = write_file(
        temp.path(),
        "template.yaml",
        "Parameters:\n  ConfigData:\n    Type: String\n    Default: !ToString\n      - !IncludeFile config.yaml\n      - ConvertTo: JSONString\n        OneLine: true",
    );

    let template = cfn_yaml::load_file(&main).unwrap();
    let config = template["Parameters"]
        .get("ConfigData")
        .and_then(|p| p.get("Default"))
        .and_then(|d| d.as_str())
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(config).unwrap();
    assert_eq!(
        parsed,
        json!({"database": {"host": "localhost", "port": 5432, "name": "mydb"}})
    );
}

#[test]
fn test_to_string_keeps_surrounding_tags() {
    let template = cfn_yaml::load(
        "Resources:\n  Bucket:\n    Type: AWS::S3::Bucket\n    Properties:\n      BucketName: !Ref BucketNameParam\n      Policy: !ToString\n        - Statement:\n            - Effect: Allow\n              Principal: !Sub \"arn:aws:iam::${AWS::AccountId}:root\"\n              Action: s3:*\n        - ConvertTo: JSONString",
        None,
    )
    .unwrap();

    let properties = template["Resources"]
        .get("Bucket")
        .and_then(|b| b.get("Properties"))
        .unwrap();
    assert!(properties.get("BucketName").unwrap().as_tagged().is_some());
    let policy = properties.get("Policy").unwrap().as_str().unwrap();
    assert!(policy.contains("Statement"));
    assert!(policy.contains("\"!Sub\": \"arn:aws:iam::${AWS::AccountId}:root\""));
}

#[test]
fn test_to_string_complex_yaml() {
    let template = cfn_yaml::load(
        "MyStack:\n  Def: !ToString\n    - users:\n        - name: John\n          roles: [admin, user]\n        - name: Jane\n          roles: [user]\n    - ConvertTo: YAMLString",
        None,
    )
    .unwrap();

    let def = template["MyStack"].get("Def").unwrap().as_str().unwrap();
    assert_eq!(
        def,
        "users:\n- name: John\n  roles:\n  - admin\n  - user\n- name: Jane\n  roles:\n  - user"
    );
}
