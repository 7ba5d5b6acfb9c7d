//! Generic admin list, add and change views over a [`ModelAdmin`]
//!
//! Authentication is enforced by the server's login wrapper; these views only
//! render and save.

use crate::model_admin::ModelAdmin;
use crate::news::get_object;
use async_trait::async_trait;
use nemi_core::{Error, Handler, Method, Request, Response, Result, TemplateContext};
use nemi_db::{Database, QuerySet, Record};
use nemi_db::record::value_as_i64;
use nemi_forms::Form;
use nemi_search::ResponseRenderer;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

pub const CHANGE_LIST_TEMPLATE: &str = "admin/change_list.html";
pub const CHANGE_FORM_TEMPLATE: &str = "admin/change_form.html";

fn base_context(admin: &dyn ModelAdmin) -> TemplateContext {
	let mut context = TemplateContext::new();
	context.insert("app_label".into(), json!(admin.app_label()));
	context.insert("model_name".into(), json!(admin.model_name()));
	context.insert("changelist_url".into(), json!(admin.changelist_url()));
	context
}

fn bound_form(admin: &dyn ModelAdmin, request: &Request) -> Result<Form> {
	let mut form = admin.form();
	form.bind_pairs(&request.form_pairs()?);
	Ok(form)
}

/// Rows of the list view, each `{pk, change_url, cells}` in `list_display` order.
pub fn list_rows(admin: &dyn ModelAdmin, records: &[Record]) -> Vec<Value> {
	let columns = admin.list_display();
	records
		.iter()
		.map(|record| {
			let pk = record.get(admin.pk_field()).and_then(value_as_i64);
			let cells: Vec<Value> = columns
				.iter()
				.map(|column| admin.display_value(column, record))
				.collect();
			json!({
				"pk": pk,
				"change_url": pk.map(|pk| admin.change_url(pk)),
				"cells": cells,
			})
		})
		.collect()
}

pub struct AdminListView {
	db: Database,
	admin: Arc<dyn ModelAdmin>,
	renderer: Arc<dyn ResponseRenderer>,
}

impl AdminListView {
	pub fn new(db: Database, admin: Arc<dyn ModelAdmin>, renderer: Arc<dyn ResponseRenderer>) -> Self {
		Self { db, admin, renderer }
	}
}

#[async_trait]
impl Handler for AdminListView {
	async fn handle(&self, _request: Request) -> Result<Response> {
		let admin = self.admin.as_ref();
		let records = QuerySet::new(admin.table_name())
			.order_by(&admin.ordering())
			.fetch(&self.db)
			.await?;

		let columns: Vec<String> = admin
			.list_display()
			.iter()
			.map(|column| admin.column_label(column))
			.collect();
		let mut context = base_context(admin);
		context.insert("columns".into(), json!(columns));
		context.insert("rows".into(), Value::Array(list_rows(admin, &records)));
		context.insert("add_url".into(), json!(admin.add_url()));
		self.renderer.render(CHANGE_LIST_TEMPLATE, &context)
	}
}

pub struct AdminAddView {
	db: Database,
	admin: Arc<dyn ModelAdmin>,
	renderer: Arc<dyn ResponseRenderer>,
}

impl AdminAddView {
	pub fn new(db: Database, admin: Arc<dyn ModelAdmin>, renderer: Arc<dyn ResponseRenderer>) -> Self {
		Self { db, admin, renderer }
	}

	fn render_form(&self, form: &Form) -> Result<Response> {
		let mut context = base_context(self.admin.as_ref());
		context.insert("form".into(), form.to_context());
		context.insert("add".into(), json!(true));
		self.renderer.render(CHANGE_FORM_TEMPLATE, &context)
	}
}

#[async_trait]
impl Handler for AdminAddView {
	async fn handle(&self, request: Request) -> Result<Response> {
		match request.method {
			Method::GET => self.render_form(&self.admin.form()),
			Method::POST => {
				let mut form = bound_form(self.admin.as_ref(), &request)?;
				if !form.is_valid() {
					return self.render_form(&form);
				}
				self.admin.create(&self.db, &form).await?;
				Ok(Response::found(&self.admin.changelist_url()))
			}
			_ => Err(Error::MethodNotAllowed(request.method.to_string())),
		}
	}
}

pub struct AdminChangeView {
	db: Database,
	admin: Arc<dyn ModelAdmin>,
	renderer: Arc<dyn ResponseRenderer>,
}

impl AdminChangeView {
	pub fn new(db: Database, admin: Arc<dyn ModelAdmin>, renderer: Arc<dyn ResponseRenderer>) -> Self {
		Self { db, admin, renderer }
	}

	fn render_form(&self, form: &Form, pk: i64) -> Result<Response> {
		let mut context = base_context(self.admin.as_ref());
		context.insert("form".into(), form.to_context());
		context.insert("add".into(), json!(false));
		context.insert("pk".into(), json!(pk));
		self.renderer.render(CHANGE_FORM_TEMPLATE, &context)
	}
}

#[async_trait]
impl Handler for AdminChangeView {
	async fn handle(&self, request: Request) -> Result<Response> {
		let pk: i64 = request.parse_path_param("id")?;
		let record = get_object(&self.db, self.admin.as_ref(), pk).await?;

		match request.method {
			Method::GET => {
				let mut form = self.admin.form();
				let initial: HashMap<String, Value> = record.into_iter().collect();
				form.set_initial(initial);
				self.render_form(&form, pk)
			}
			Method::POST => {
				let mut form = bound_form(self.admin.as_ref(), &request)?;
				if !form.is_valid() {
					return self.render_form(&form, pk);
				}
				self.admin.update(&self.db, pk, &form).await?;
				Ok(Response::found(&self.admin.changelist_url()))
			}
			_ => Err(Error::MethodNotAllowed(request.method.to_string())),
		}
	}
}
