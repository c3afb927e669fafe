use async_trait::async_trait;
use daybook_core::storage::{
  Storage,
  StorageError
};
use wasm_bindgen::JsValue;

/// `window.localStorage` behind the core storage port.
pub struct LocalStorage {
  inner: web_sys::Storage
}

impl LocalStorage {
  pub fn open()
  -> Result<Self, StorageError> {
    let window = web_sys::window()
      .ok_or_else(|| {
        StorageError::Unavailable(
          "no window".to_string()
        )
      })?;
    let inner = window
      .local_storage()
      .map_err(|err| {
        StorageError::Unavailable(
          js_message(&err)
        )
      })?
      .ok_or_else(|| {
        StorageError::Unavailable(
          "localStorage disabled"
            .to_string()
        )
      })?;
    Ok(Self {
      inner
    })
  }
}

#[async_trait(?Send)]
impl Storage for LocalStorage {
  async fn get(
    &self,
    key: &str
  ) -> Result<Option<String>, StorageError>
  {
    self.inner.get_item(key).map_err(
      |err| StorageError::Read {
        key:     key.to_string(),
        message: js_message(&err)
      }
    )
  }

  async fn set(
    &self,
    key: &str,
    value: &str
  ) -> Result<(), StorageError> {
    self
      .inner
      .set_item(key, value)
      .map_err(|err| {
        StorageError::Write {
          key:     key.to_string(),
          message: js_message(&err)
        }
      })
  }
}

fn js_message(value: &JsValue) -> String {
  value
    .as_string()
    .unwrap_or_else(|| format!("{value:?}"))
}
