//! Create/read/update/delete cycles for one resource on top of the reconciler.

use cfgtree_core::{
    ConfigObject, DecodeReport, FieldKind, FieldPath, MemoryState, PatchTable, ReconcileError,
    ReconcileOptions, Reconciler, ResourceSchema, Scalar, ScalarKind, StateError, StateStore,
    TypedBlock, TypedValue, DYNAMIC_SORT_SUBTABLE,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{key_string, ApiError, ConfigApi, RequestParams, MKEY};

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("{resource}: required parameter '{param}' is not set")]
    MissingParam { resource: String, param: String },
    #[error("{resource}: object identity '{field}' is not set")]
    MissingKey { resource: String, field: String },
    #[error("{resource}: {source}")]
    Reconcile {
        resource: String,
        source: ReconcileError,
    },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result of a read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Found(DecodeReport),
    /// The object no longer exists; state was cleared.
    Gone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyAction {
    Created,
    Updated,
}

/// Drives one resource type against a [`ConfigApi`].
pub struct ResourceDriver<'a> {
    reconciler: Reconciler<'a>,
}

impl<'a> ResourceDriver<'a> {
    pub fn new(schema: &'a ResourceSchema, patches: &'a PatchTable, options: ReconcileOptions) -> Self {
        Self {
            reconciler: Reconciler::new(schema, patches, options),
        }
    }

    pub fn schema(&self) -> &ResourceSchema {
        self.reconciler.schema()
    }

    fn resource_type(&self) -> &str {
        &self.schema().resource_type
    }

    /// Collect the declared correlation parameters.
    ///
    /// Parameters backed by a state field are read from `state`, falling back
    /// to `provided`; the rest must be in `provided`. Undeclared entries of
    /// `provided` are not sent.
    pub fn resolve_params(
        &self,
        state: &dyn StateStore,
        provided: &RequestParams,
    ) -> Result<RequestParams, ResourceError> {
        let mut params = RequestParams::new();
        for param in &self.schema().params {
            let value = match &param.field {
                Some(field) => state
                    .get_ok(&FieldPath::root(field.as_str()))
                    .and_then(TypedValue::as_scalar)
                    .map(Scalar::to_string)
                    .or_else(|| provided.get(&param.name).map(str::to_string)),
                None => provided.get(&param.name).map(str::to_string),
            };
            match value {
                Some(value) if !value.is_empty() => params.insert(param.name.as_str(), value),
                _ => {
                    return Err(ResourceError::MissingParam {
                        resource: self.resource_type().to_string(),
                        param: param.name.clone(),
                    })
                }
            }
        }
        Ok(params)
    }

    /// Identity of the object held in `state`. Singletons use the resource type.
    pub fn object_id(&self, state: &dyn StateStore) -> Result<String, ResourceError> {
        let Some(key) = self.schema().key_field() else {
            return Ok(self.resource_type().to_string());
        };
        state
            .get_ok(&FieldPath::root(key.local_name.as_str()))
            .and_then(TypedValue::as_scalar)
            .map(Scalar::to_string)
            .ok_or_else(|| ResourceError::MissingKey {
                resource: self.resource_type().to_string(),
                field: key.local_name.clone(),
            })
    }

    /// Send the whole state as a new object, then read it back.
    pub fn create(
        &self,
        api: &mut dyn ConfigApi,
        state: &mut MemoryState,
        provided: &RequestParams,
    ) -> Result<ReadOutcome, ResourceError> {
        let params = self.resolve_params(state, provided)?;
        let body = self.encode(state)?;
        let response = api.create(self.resource_type(), &body, &params)?;

        let key = response
            .get(MKEY)
            .and_then(key_string)
            .map(Ok)
            .unwrap_or_else(|| self.object_id(state))?;
        self.store_key(state, &key)?;
        info!(resource = self.resource_type(), %key, %params, "created");

        self.read(api, state, provided, &key)
    }

    /// Refresh `state` from the device and accept the result as the new baseline.
    pub fn read(
        &self,
        api: &dyn ConfigApi,
        state: &mut MemoryState,
        provided: &RequestParams,
        key: &str,
    ) -> Result<ReadOutcome, ResourceError> {
        let params = self.resolve_params(state, provided)?;
        match api.read(self.resource_type(), key, &params) {
            Ok(object) => {
                let report = self.decode(&object, state)?;
                state.commit();
                debug!(resource = self.resource_type(), %key, outcomes = report.outcomes.len(), "read");
                Ok(ReadOutcome::Found(report))
            }
            Err(err) if err.is_not_found() => {
                warn!(resource = self.resource_type(), %key, %params, "object is gone, clearing state");
                state.reset();
                state.commit();
                Ok(ReadOutcome::Gone)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Send explicit values and pending changes, then read back.
    pub fn update(
        &self,
        api: &mut dyn ConfigApi,
        state: &mut MemoryState,
        provided: &RequestParams,
    ) -> Result<ReadOutcome, ResourceError> {
        let params = self.resolve_params(state, provided)?;
        let key = self.object_id(state)?;
        let body = self.encode(state)?;
        api.update(self.resource_type(), &body, &key, &params)?;
        info!(resource = self.resource_type(), %key, %params, fields = body.len(), "updated");
        self.read(api, state, provided, &key)
    }

    /// Update when the object exists on the device, create otherwise.
    pub fn apply(
        &self,
        api: &mut dyn ConfigApi,
        state: &mut MemoryState,
        provided: &RequestParams,
    ) -> Result<(ApplyAction, ReadOutcome), ResourceError> {
        let params = self.resolve_params(state, provided)?;
        let exists = match self.object_id(state) {
            Ok(key) => match api.read(self.resource_type(), &key, &params) {
                Ok(_) => true,
                Err(err) if err.is_not_found() => false,
                Err(err) => return Err(err.into()),
            },
            Err(ResourceError::MissingKey { .. }) => false,
            Err(err) => return Err(err),
        };
        if exists {
            Ok((ApplyAction::Updated, self.update(api, state, provided)?))
        } else {
            Ok((ApplyAction::Created, self.create(api, state, provided)?))
        }
    }

    /// Remove the object. A missing object counts as deleted.
    pub fn delete(
        &self,
        api: &mut dyn ConfigApi,
        state: &mut MemoryState,
        provided: &RequestParams,
    ) -> Result<(), ResourceError> {
        let params = self.resolve_params(state, provided)?;
        let key = self.object_id(state)?;
        match api.delete(self.resource_type(), &key, &params) {
            Ok(()) => info!(resource = self.resource_type(), %key, %params, "deleted"),
            Err(err) if err.is_not_found() => {
                debug!(resource = self.resource_type(), %key, "already gone")
            }
            Err(err) => return Err(err.into()),
        }
        state.reset();
        state.commit();
        Ok(())
    }

    pub fn decode(&self, object: &ConfigObject, state: &mut dyn StateStore) -> Result<DecodeReport, ResourceError> {
        self.reconciler
            .decode_all(object, state)
            .map_err(|source| self.reconcile_error(source))
    }

    pub fn encode(&self, state: &dyn StateStore) -> Result<ConfigObject, ResourceError> {
        self.reconciler
            .encode_all(state)
            .map_err(|source| self.reconcile_error(source))
    }

    fn reconcile_error(&self, source: ReconcileError) -> ResourceError {
        ResourceError::Reconcile {
            resource: self.resource_type().to_string(),
            source,
        }
    }

    /// State holding only the identity `key`, for operations addressed by key.
    pub fn identity_state(&self, key: &str) -> Result<MemoryState, ResourceError> {
        let mut state = MemoryState::default();
        self.store_key(&mut state, key)?;
        state.commit();
        Ok(state)
    }

    /// Record the identity assigned by the device in the key field.
    fn store_key(&self, state: &mut dyn StateStore, key: &str) -> Result<(), ResourceError> {
        let Some(spec) = self.schema().key_field() else {
            return Ok(());
        };
        let scalar = match spec.kind {
            FieldKind::Scalar(ScalarKind::Integer) => match key.parse::<i64>() {
                Ok(id) => Scalar::Int(id),
                Err(_) => {
                    return Err(ResourceError::MissingKey {
                        resource: self.resource_type().to_string(),
                        field: spec.local_name.clone(),
                    })
                }
            },
            _ => Scalar::Str(key.to_string()),
        };
        state
            .set(&FieldPath::root(spec.local_name.as_str()), TypedValue::Scalar(scalar))
            .map_err(|err| self.reconcile_error(ReconcileError::State(err)))
    }
}

/// Load exported typed state (local names) for `schema`.
///
/// The `dynamic_sort_subtable` switch is not a schema field but is kept when
/// present so it reaches the decode hook.
pub fn state_from_json(schema: &ResourceSchema, json: &Value) -> Result<TypedBlock, StateError> {
    let mut block = cfgtree_core::typed_block_from_json(&schema.fields, json)?;
    if let Some(sort) = json.get(DYNAMIC_SORT_SUBTABLE).and_then(Value::as_str) {
        block.insert(DYNAMIC_SORT_SUBTABLE.to_string(), TypedValue::string(sort));
    }
    Ok(block)
}

/// Export typed state as JSON keyed by local names.
pub fn state_to_json(block: &TypedBlock) -> Value {
    serde_json::to_value(block).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use cfgtree_core::{
        FieldPath, MemoryState, PatchTable, ReconcileOptions, Scalar, StateStore, TypedBlock,
        TypedValue,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{state_from_json, ApplyAction, ReadOutcome, ResourceDriver, ResourceError};
    use crate::client::{ConfigApi, MemoryApi, RequestParams};
    use crate::resources::{system_dhcp_server, system_dhcp_server_reserved_address, web_proxy_explicit};

    fn device_params() -> RequestParams {
        let mut params = RequestParams::new();
        params.insert("device_name", "fgt1");
        params.insert("device_vdom", "root");
        params
    }

    fn dhcp_state() -> MemoryState {
        let schema = system_dhcp_server::schema();
        let block = state_from_json(
            &schema,
            &json!({
                "status": "enable",
                "interface": ["port2"],
                "ip_range": [{"id": 1, "start_ip": "10.0.0.10", "end_ip": "10.0.0.99"}]
            }),
        )
        .expect("state");
        MemoryState::with_prior(block, TypedBlock::new())
    }

    #[test]
    fn missing_param_fails_before_any_call() {
        let schema = system_dhcp_server::schema();
        let patches = PatchTable::new();
        let driver = ResourceDriver::new(&schema, &patches, ReconcileOptions::default());
        let mut api = MemoryApi::new();
        let mut state = dhcp_state();

        let mut params = RequestParams::new();
        params.insert("device_name", "fgt1");
        let err = driver
            .create(&mut api, &mut state, &params)
            .expect_err("missing vdom");
        assert!(matches!(err, ResourceError::MissingParam { ref param, .. } if param == "device_vdom"));
        assert!(api.objects().is_empty());
    }

    #[test]
    fn create_assigns_key_and_reads_back() {
        let schema = system_dhcp_server::schema();
        let patches = PatchTable::new();
        let driver = ResourceDriver::new(&schema, &patches, ReconcileOptions::default());
        let mut api = MemoryApi::new();
        api.register_key_field("system_dhcp_server", "id");
        let mut state = dhcp_state();

        let outcome = driver
            .create(&mut api, &mut state, &device_params())
            .expect("create");
        assert!(matches!(outcome, ReadOutcome::Found(_)));
        assert_eq!(
            state.get(&FieldPath::root("id")),
            Some(&TypedValue::Scalar(Scalar::Int(1)))
        );
        assert_eq!(
            state.get(&"ip_range.0.end_ip".parse().expect("path")),
            Some(&TypedValue::string("10.0.0.99"))
        );
        assert!(!state.has_change(&FieldPath::root("status")));
    }

    #[test]
    fn update_sends_only_changes() {
        let schema = system_dhcp_server::schema();
        let patches = PatchTable::new();
        let driver = ResourceDriver::new(&schema, &patches, ReconcileOptions::default());
        let mut api = MemoryApi::new();
        api.register_key_field("system_dhcp_server", "id");
        let mut state = dhcp_state();
        driver
            .create(&mut api, &mut state, &device_params())
            .expect("create");

        state
            .set(&FieldPath::root("status"), TypedValue::string("disable"))
            .expect("set");
        let body = driver.encode(&state).expect("encode");
        assert_eq!(body.get("status"), Some(&json!("disable")));

        let (action, _) = driver
            .apply(&mut api, &mut state, &device_params())
            .expect("apply");
        assert_eq!(action, ApplyAction::Updated);
        let stored = api
            .read("system_dhcp_server", "1", &driver.resolve_params(&state, &device_params()).expect("params"))
            .expect("read");
        assert_eq!(stored.get("status"), Some(&json!("disable")));
    }

    #[test]
    fn read_of_missing_object_clears_state() {
        let schema = system_dhcp_server::schema();
        let patches = PatchTable::new();
        let driver = ResourceDriver::new(&schema, &patches, ReconcileOptions::default());
        let api = MemoryApi::new();
        let mut state = dhcp_state();

        let outcome = driver
            .read(&api, &mut state, &device_params(), "7")
            .expect("read");
        assert_eq!(outcome, ReadOutcome::Gone);
        assert!(state.current().is_empty());
        assert!(!state.has_change(&FieldPath::root("status")));
    }

    #[test]
    fn parent_identity_comes_from_state_only_field() {
        let schema = system_dhcp_server_reserved_address::schema();
        let patches = PatchTable::new();
        let driver = ResourceDriver::new(&schema, &patches, ReconcileOptions::default());
        let mut api = MemoryApi::new();
        api.register_key_field(&schema.resource_type, "id");

        let block = state_from_json(&schema, &json!({"server": "4", "ip": "10.0.0.5", "mac": "00:11:22:33:44:55"}))
            .expect("state");
        let mut state = MemoryState::with_prior(block, TypedBlock::new());

        let params = driver
            .resolve_params(&state, &device_params())
            .expect("params");
        assert_eq!(params.get("server"), Some("4"));

        driver
            .create(&mut api, &mut state, &device_params())
            .expect("create");
        let stored = api.read(&schema.resource_type, "1", &params).expect("stored");
        assert!(stored.get("server").is_none());
        assert_eq!(state.get(&FieldPath::root("server")), Some(&TypedValue::string("4")));
    }

    #[test]
    fn singleton_identity_is_the_resource_type() {
        let schema = web_proxy_explicit::schema();
        let patches = PatchTable::new();
        let driver = ResourceDriver::new(&schema, &patches, ReconcileOptions::default());
        let mut api = MemoryApi::new();
        let block = state_from_json(&schema, &json!({"status": "enable"})).expect("state");
        let mut state = MemoryState::with_prior(block, TypedBlock::new());

        assert_eq!(driver.object_id(&state).expect("id"), "web_proxy_explicit");
        let (action, _) = driver
            .apply(&mut api, &mut state, &device_params())
            .expect("apply");
        assert_eq!(action, ApplyAction::Created);

        driver
            .delete(&mut api, &mut state, &device_params())
            .expect("delete");
        assert!(state.current().is_empty());
    }

    #[test]
    fn identity_state_types_the_key() {
        let schema = system_dhcp_server::schema();
        let patches = PatchTable::new();
        let driver = ResourceDriver::new(&schema, &patches, ReconcileOptions::default());

        let state = driver.identity_state("12").expect("state");
        assert_eq!(driver.object_id(&state).expect("id"), "12");
        assert_eq!(
            state.get(&FieldPath::root("id")),
            Some(&TypedValue::Scalar(Scalar::Int(12)))
        );
        assert!(matches!(
            driver.identity_state("twelve"),
            Err(ResourceError::MissingKey { .. })
        ));
    }

    #[test]
    fn sort_switch_survives_state_loading() {
        let schema = system_dhcp_server::schema();
        let block = state_from_json(&schema, &json!({"dynamic_sort_subtable": "true"})).expect("state");
        assert_eq!(block.get("dynamic_sort_subtable"), Some(&TypedValue::string("true")));
    }
}
