use apistack_lib::construct::App;
use apistack_lib::declaration::{ApiStack, ApiStackOptions};

pub const STACK: &str = "InfraStack";

/// An app holding one declared API stack.
pub fn declared_app(with_store: bool) -> (App, ApiStack) {
  let mut app = App::new();
  let options = ApiStackOptions {
    with_store,
    ..ApiStackOptions::default()
  };
  let declared = ApiStack::construct(&mut app, STACK, &options).expect("declaration should succeed");
  (app, declared)
}
