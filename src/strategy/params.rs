use super::Strategy;
use crate::context::{RequestContext, PARAM_METHOD};
use crate::error::Rejection;
use async_trait::async_trait;
use tracing::debug;

pub const REQUIRED_PARAMS_ORDER: i32 = -500;

/// Declines requests that lack a required parameter.
///
/// By default only `method` is required. Empty values count as missing.
pub struct RequiredParamsStrategy {
    required: Vec<String>,
}

impl RequiredParamsStrategy {
    #[must_use]
    pub fn new(required: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for RequiredParamsStrategy {
    fn default() -> Self {
        Self::new([PARAM_METHOD])
    }
}

#[async_trait]
impl Strategy for RequiredParamsStrategy {
    fn name(&self) -> &str {
        "required_params"
    }

    fn order(&self) -> i32 {
        REQUIRED_PARAMS_ORDER
    }

    async fn pre_handle(&self, ctx: &mut RequestContext) -> anyhow::Result<bool> {
        let missing = self
            .required
            .iter()
            .find(|name| ctx.param(name).is_none_or(str::is_empty));
        if let Some(name) = missing {
            debug!(trace_id = %ctx.trace_id(), parameter = %name, "Missing required parameter");
            ctx.reject(Rejection::bad_request(
                "MISSING_PARAMETER",
                format!("missing required parameter '{name}'"),
            ));
            return Ok(false);
        }
        Ok(true)
    }
}
