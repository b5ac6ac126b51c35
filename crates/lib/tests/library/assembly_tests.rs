//! Tests for writing synthesized output and diffing against it.

use tempfile::TempDir;

use apistack_lib::assembly::{AssemblyStore, compute_diff};
use apistack_lib::construct::App;
use apistack_lib::declaration::{ApiStack, ApiStackOptions};
use apistack_lib::util::hash::Hashable;

use super::common::{STACK, declared_app};

#[test]
fn written_assembly_round_trips() {
  let temp = TempDir::new().unwrap();
  let (app, _) = declared_app(true);
  let assembly = app.synth().unwrap();

  let store = AssemblyStore::new(temp.path());
  store.write(&assembly).unwrap();

  let loaded = store.load().unwrap().expect("assembly should exist");
  assert_eq!(loaded, assembly);

  let artifact = &loaded.manifest.artifacts[STACK];
  assert_eq!(artifact.template_hash, loaded.templates[STACK].compute_hash().unwrap());
}

#[test]
fn resynthesis_is_a_no_op_diff() {
  let temp = TempDir::new().unwrap();
  let store = AssemblyStore::new(temp.path());

  let (app, _) = declared_app(true);
  store.write(&app.synth().unwrap()).unwrap();

  let (app, _) = declared_app(true);
  let desired = app.synth().unwrap();
  let current = store.load_template(STACK).unwrap();
  let diff = compute_diff(&desired.templates[STACK], current.as_ref());
  assert!(diff.is_empty(), "unexpected changes: {diff:?}");
}

#[test]
fn dropping_the_store_removes_its_resources() {
  let (with_store, _) = declared_app(true);
  let (without_store, _) = declared_app(false);
  let current = with_store.synth().unwrap();
  let desired = without_store.synth().unwrap();

  let diff = compute_diff(&desired.templates[STACK], current.template(STACK));

  assert!(diff.resources_to_add.is_empty());
  let removed: Vec<&str> = diff.resources_to_remove.iter().map(|c| c.type_name.as_str()).collect();
  assert!(removed.contains(&"AWS::S3::Bucket"));
  assert!(removed.contains(&"Custom::S3AutoDeleteObjects"));
  assert!(removed.contains(&"AWS::IAM::Policy"));
  assert_eq!(
    removed.iter().filter(|t| **t == "AWS::ApiGatewayV2::Route").count(),
    1
  );

  // The function loses BUCKET_NAME and its policy dependency.
  assert_eq!(diff.resources_to_update.len(), 1);
  assert_eq!(diff.resources_to_update[0].type_name, "AWS::Lambda::Function");
  assert_eq!(diff.outputs_removed, vec!["itemsBucketName"]);
}

#[test]
fn manifest_lists_every_stack() {
  let mut app = App::new();
  ApiStack::construct(&mut app, "Primary", &ApiStackOptions::default()).unwrap();
  ApiStack::construct(
    &mut app,
    "Minimal",
    &ApiStackOptions {
      with_store: false,
      env: None,
    },
  )
  .unwrap();

  let assembly = app.synth().unwrap();
  let names: Vec<&str> = assembly.manifest.artifacts.keys().map(String::as_str).collect();
  assert_eq!(names, vec!["Minimal", "Primary"]);
  assert_eq!(assembly.manifest.artifacts["Minimal"].template_file, "Minimal.template.json");
}
