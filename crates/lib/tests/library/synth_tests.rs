//! Tests for the synthesized template of the API stack.

use serde_json::json;

use apistack_lib::template::Template;

use super::common::{STACK, declared_app};

fn synth(with_store: bool) -> Template {
  let (app, declared) = declared_app(with_store);
  declared.stack(&app).unwrap().synth().unwrap()
}

fn resource<'a>(template: &'a Template, path: &str) -> &'a apistack_lib::template::CfnResource {
  let id = template
    .logical_id_for_path(&format!("{STACK}/{path}"))
    .unwrap_or_else(|| panic!("no resource at {path}"));
  &template.resources[id]
}

mod routing {
  use super::*;

  #[test]
  fn route_keys_and_integrations() {
    let template = synth(true);

    let route_keys: Vec<&str> = template
      .resources_of_type("AWS::ApiGatewayV2::Route")
      .map(|(_, r)| r.properties["RouteKey"].as_str().unwrap())
      .collect();
    assert_eq!(route_keys.len(), 2);
    assert!(route_keys.contains(&"GET /health"));
    assert!(route_keys.contains(&"GET /items"));

    for (_, integration) in template.resources_of_type("AWS::ApiGatewayV2::Integration") {
      assert_eq!(integration.properties["IntegrationType"], json!("AWS_PROXY"));
      assert_eq!(integration.properties["PayloadFormatVersion"], json!("2.0"));
    }
  }

  #[test]
  fn integrations_target_the_same_function() {
    let template = synth(true);
    let function_id = template.logical_id_for_path(&format!("{STACK}/api_lambda/Resource")).unwrap();

    let uris: Vec<&serde_json::Value> = template
      .resources_of_type("AWS::ApiGatewayV2::Integration")
      .map(|(_, r)| &r.properties["IntegrationUri"])
      .collect();
    assert_eq!(uris.len(), 2);
    for uri in uris {
      assert_eq!(uri, &json!({ "Fn::GetAtt": [function_id, "Arn"] }));
    }
  }

  #[test]
  fn default_stage_auto_deploys() {
    let template = synth(false);
    let stage = resource(&template, "http_api/DefaultStage/Resource");
    assert_eq!(stage.type_name, "AWS::ApiGatewayV2::Stage");
    assert_eq!(stage.properties["StageName"], json!("$default"));
    assert_eq!(stage.properties["AutoDeploy"], json!(true));
  }

  #[test]
  fn permission_scoped_to_route_path() {
    let template = synth(false);
    let permission = resource(&template, "http_api/GET--health/health_integration-Permission");
    assert_eq!(permission.properties["Principal"], json!("apigateway.amazonaws.com"));

    let source_arn = permission.properties["SourceArn"]["Fn::Join"][1].as_array().unwrap();
    assert_eq!(source_arn.last().unwrap(), &json!("/*/*/health"));
  }
}

mod store {
  use super::*;

  #[test]
  fn bucket_is_deleted_with_stack() {
    let template = synth(true);
    let bucket = resource(&template, "items_bucket/Resource");
    assert_eq!(bucket.deletion_policy.as_deref(), Some("Delete"));
    assert_eq!(bucket.update_replace_policy.as_deref(), Some("Delete"));
    assert_eq!(
      bucket.properties["Tags"][0],
      json!({ "Key": "aws-cdk:auto-delete-objects", "Value": "true" })
    );
  }

  #[test]
  fn auto_delete_resource_waits_for_policy() {
    let template = synth(true);
    let policy_id = template
      .logical_id_for_path(&format!("{STACK}/items_bucket/Policy/Resource"))
      .unwrap();
    let purge = resource(&template, "items_bucket/AutoDeleteObjectsCustomResource/Default");
    assert_eq!(purge.type_name, "Custom::S3AutoDeleteObjects");
    assert_eq!(purge.depends_on, vec![policy_id.to_string()]);
  }

  #[test]
  fn function_depends_on_its_policy() {
    let template = synth(true);
    let function = resource(&template, "api_lambda/Resource");
    let policy_id = template
      .logical_id_for_path(&format!("{STACK}/api_lambda/ServiceRole/DefaultPolicy/Resource"))
      .unwrap();
    assert!(function.depends_on.iter().any(|d| d == policy_id));

    let bucket_id = template.logical_id_for_path(&format!("{STACK}/items_bucket/Resource")).unwrap();
    assert_eq!(
      function.properties["Environment"]["Variables"]["BUCKET_NAME"],
      json!({ "Ref": bucket_id })
    );
  }

  #[test]
  fn minimal_variant_has_no_environment() {
    let template = synth(false);
    let function = resource(&template, "api_lambda/Resource");
    assert!(function.properties.get("Environment").is_none());
    assert_eq!(function.depends_on.len(), 1);
  }
}

mod outputs {
  use super::*;

  #[test]
  fn output_ids_are_sanitized() {
    let template = synth(true);
    let ids: Vec<&str> = template.outputs.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["apiurl", "itemsBucketName"]);
  }

  #[test]
  fn api_url_renders_as_sub() {
    let template = synth(false);
    let api_id = template.logical_id_for_path(&format!("{STACK}/http_api/Resource")).unwrap();
    assert_eq!(
      template.outputs["apiurl"].value,
      json!({ "Fn::Sub": format!("https://${{{api_id}}}.execute-api.${{AWS::Region}}.${{AWS::URLSuffix}}") })
    );
  }
}

#[test]
fn synthesis_is_deterministic() {
  let first = serde_json::to_string(&synth(true)).unwrap();
  let second = serde_json::to_string(&synth(true)).unwrap();
  assert_eq!(first, second);
}

#[test]
fn logical_ids_carry_hash_suffix() {
  let template = synth(true);
  let bucket_id = template.logical_id_for_path(&format!("{STACK}/items_bucket/Resource")).unwrap();
  let (readable, suffix) = bucket_id.split_at(bucket_id.len() - 8);
  assert_eq!(readable, "itemsbucket");
  assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
}
