use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::{
    domain::{ChainDescriptor, TxHash},
    error::{ErrorCode, RpcError},
    protocol::{methods, RegisterParams, RpcRequest, RpcResponse, SetRecordParams, SwitchChainParams},
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::chain::DevChain;

pub async fn dispatch(chain: &Mutex<DevChain>, request: RpcRequest) -> RpcResponse {
    let id = request.id;
    debug!(method = %request.method, id, "rpc: request");
    match handle(chain, &request.method, &request.params).await {
        Ok(result) => RpcResponse::ok(id, result),
        Err(error) => {
            debug!(method = %request.method, code = error.code, message = %error.message, "rpc: error");
            RpcResponse::err(id, error)
        }
    }
}

async fn handle(chain: &Mutex<DevChain>, method: &str, params: &Value) -> Result<Value, RpcError> {
    let mut chain = chain.lock().await;
    match method {
        methods::ACCOUNTS => to_value(chain.authorized_accounts()),
        methods::REQUEST_ACCOUNTS => to_value(chain.request_accounts()?),
        methods::CHAIN_ID => to_value(chain.chain_id()),
        methods::SWITCH_CHAIN => {
            let SwitchChainParams { chain_id } = param(params, 0)?;
            chain.switch_chain(chain_id)?;
            Ok(Value::Null)
        }
        methods::ADD_CHAIN => {
            let descriptor: ChainDescriptor = param(params, 0)?;
            chain.add_chain(&descriptor)?;
            Ok(Value::Null)
        }
        methods::REGISTER => {
            let RegisterParams { from, name, value } = param(params, 0)?;
            to_value(chain.register(&from, &name, value)?)
        }
        methods::SET_RECORD => {
            let SetRecordParams { from, name, record } = param(params, 0)?;
            to_value(chain.set_record(&from, &name, &record)?)
        }
        methods::GET_NAMES => to_value(chain.names()),
        methods::RECORDS => {
            let name: String = param(params, 0)?;
            to_value(chain.record(&name))
        }
        methods::DOMAINS => {
            let name: String = param(params, 0)?;
            to_value(chain.owner(&name))
        }
        methods::GET_RECEIPT => {
            let hash: TxHash = param(params, 0)?;
            Ok(chain.receipt(&hash).map_or(Value::Null, |receipt| json!(receipt)))
        }
        other => Err(RpcError::new(
            ErrorCode::MethodNotFound,
            format!("method '{other}' not found"),
        )),
    }
}

fn param<T: DeserializeOwned>(params: &Value, index: usize) -> Result<T, RpcError> {
    let raw = params.get(index).cloned().ok_or_else(|| {
        RpcError::new(ErrorCode::InvalidParams, format!("missing parameter {index}"))
    })?;
    serde_json::from_value(raw)
        .map_err(|err| RpcError::new(ErrorCode::InvalidParams, format!("parameter {index}: {err}")))
}

fn to_value(value: impl serde::Serialize) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|err| RpcError::new(ErrorCode::Internal, err.to_string()))
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
