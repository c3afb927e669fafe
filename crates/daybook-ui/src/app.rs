mod calendar_page;
mod list_page;

use std::rc::Rc;

use daybook_core::storage::{
  MemoryStorage,
  Storage
};
use daybook_core::{
  Config,
  TaskBook,
  TaskStore
};
use yew::{
  ContextProvider,
  Html,
  UseStateHandle,
  function_component,
  html
};
use yew_router::{
  BrowserRouter,
  Routable,
  Switch
};

use self::calendar_page::CalendarPage;
use self::list_page::ListPage;
use crate::storage::LocalStorage;

const CONFIG_TOML: &str =
  include_str!("../assets/daybook.toml");

#[derive(
  Clone, Copy, Routable, PartialEq, Eq,
)]
pub enum Route {
  #[at("/")]
  List,
  #[at("/calendar")]
  Calendar,
  #[not_found]
  #[at("/404")]
  NotFound
}

/// Shared by both pages. Each page still loads its own snapshot of the book
/// on mount; only the config and the sequenced writers are shared.
#[derive(Clone)]
pub struct AppContext {
  pub config: Rc<Config>,
  pub store:  Rc<TaskStore>
}

impl PartialEq for AppContext {
  fn eq(&self, other: &Self) -> bool {
    Rc::ptr_eq(
      &self.config,
      &other.config
    ) && Rc::ptr_eq(
      &self.store,
      &other.store
    )
  }
}

#[function_component(App)]
pub fn app() -> Html {
  let context =
    yew::use_memo((), |_| {
      build_context()
    });

  html! {
      <ContextProvider<AppContext> context={(*context).clone()}>
          <BrowserRouter>
              <Switch<Route> render={switch} />
          </BrowserRouter>
      </ContextProvider<AppContext>>
  }
}

fn switch(route: Route) -> Html {
  match route {
    | Route::List
    | Route::NotFound => {
      html! { <ListPage /> }
    }
    | Route::Calendar => {
      html! { <CalendarPage /> }
    }
  }
}

fn build_context() -> AppContext {
  let config = load_config();
  let storage: Rc<dyn Storage> =
    match LocalStorage::open() {
      | Ok(local) => Rc::new(local),
      | Err(error) => {
        tracing::error!(%error, "localStorage unavailable; tasks live in memory for this session");
        Rc::new(MemoryStorage::new())
      }
    };

  AppContext {
    store:  Rc::new(TaskStore::new(
      storage,
      &config.storage
    )),
    config: Rc::new(config)
  }
}

fn load_config() -> Config {
  match Config::from_toml_str(
    CONFIG_TOML
  ) {
    | Ok(config) => config,
    | Err(error) => {
      tracing::error!(error = %format!("{error:#}"), "failed parsing daybook config; using defaults");
      Config::default()
    }
  }
}

/// Publishes `next` to the page and writes it back without waiting. Each
/// write is logged on failure and otherwise forgotten.
pub fn commit_book(
  handle: &UseStateHandle<
    Option<TaskBook>
  >,
  store: &TaskStore,
  next: TaskBook
) {
  match store.stage(&next) {
    | Ok(writes) => {
      for write in writes {
        wasm_bindgen_futures::spawn_local(
          async move {
            let key =
              write.key().to_string();
            if let Err(error) =
              write.commit().await
            {
              tracing::error!(%key, %error, "failed to save");
            }
          }
        );
      }
    }
    | Err(error) => {
      tracing::error!(%error, "failed to serialize tasks");
    }
  }

  handle.set(Some(next));
}
