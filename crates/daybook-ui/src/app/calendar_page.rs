use std::rc::Rc;

use daybook_core::calendar::{
  CalendarCallbacks,
  CalendarRender,
  CalendarRenderer
};
use daybook_core::navigation::{
  CalendarArrival,
  ListArrival
};
use daybook_core::view::CalendarView;
use daybook_core::TaskBook;
use yew::{
  Callback,
  Html,
  UseStateHandle,
  function_component,
  html,
  use_context,
  use_effect_with,
  use_state
};
use yew_router::hooks::{
  use_location,
  use_navigator
};

use super::{
  AppContext,
  Route
};
use crate::components::{
  MonthGrid,
  MountedCalendar,
  ui_text
};

/// Hands render requests to the page state; `MonthGrid` draws whatever is
/// mounted there.
struct YewCalendarRenderer {
  slot: UseStateHandle<
    Option<Rc<MountedCalendar>>
  >
}

impl CalendarRenderer
  for YewCalendarRenderer
{
  fn render(
    &mut self,
    request: CalendarRender,
    callbacks: CalendarCallbacks
  ) {
    self.slot.set(Some(Rc::new(
      MountedCalendar {
        request,
        callbacks
      }
    )));
  }

  fn dispose(&mut self) {
    tracing::debug!(
      "disposing calendar"
    );
    self.slot.set(None);
  }
}

#[function_component(CalendarPage)]
pub fn calendar_page() -> Html {
  let Some(ctx) =
    use_context::<AppContext>()
  else {
    tracing::error!(
      "calendar page rendered without app context"
    );
    return html! {};
  };
  let navigator = use_navigator();
  let location = use_location();
  let today = ctx.config.today();

  let view = {
    let arrival = location
      .as_ref()
      .and_then(|loc| {
        loc.state::<CalendarArrival>()
      });
    use_state(move || {
      CalendarView::from_arrival(
        arrival.as_deref(),
        today
      )
    })
  };
  let book =
    use_state(|| None::<TaskBook>);
  let mounted = use_state(
    || None::<Rc<MountedCalendar>>
  );

  {
    let book = book.clone();
    let store = Rc::clone(&ctx.store);
    use_effect_with((), move |_| {
      wasm_bindgen_futures::spawn_local(
        async move {
          let loaded =
            store.load_or_default().await;
          book.set(Some(loaded));
        }
      );
      || ()
    });
  }

  let navigate: Rc<dyn Fn(ListArrival)> = {
    let navigator = navigator.clone();
    Rc::new(move |arrival: ListArrival| {
      match &navigator {
        | Some(navigator) => {
          navigator.push_with_state(
            &Route::List,
            arrival
          )
        }
        | None => {
          tracing::warn!(
            "navigator unavailable"
          )
        }
      }
    })
  };

  {
    let mounted = mounted.clone();
    let config = Rc::clone(&ctx.config);
    let navigate = Rc::clone(&navigate);
    use_effect_with(
      ((*book).clone(), *view),
      move |(book, view)| {
        let mut renderer =
          YewCalendarRenderer {
            slot: mounted
          };
        if let Some(book) = book {
          view.mount(
            &mut renderer,
            book.tasks(),
            &config,
            today,
            navigate
          );
        }
        move || renderer.dispose()
      }
    );
  }

  let on_back = {
    let view = *view;
    Callback::from(move |_| {
      navigate(view.back_to_list())
    })
  };

  let text = ui_text(ctx.config.locale);

  html! {
      <div class="calendar-page">
          <div class="calendar-actions">
              <button type="button" class="primary" onclick={on_back}>
                  { text.to_list }
              </button>
          </div>
          {
              match &*mounted {
                  Some(calendar) => html! { <MonthGrid calendar={Rc::clone(calendar)} /> },
                  None => html! { <div class="loading">{ text.loading }</div> }
              }
          }
      </div>
  }
}
