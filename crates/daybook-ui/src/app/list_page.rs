use std::rc::Rc;
use std::str::FromStr;

use chrono::NaiveDate;
use daybook_core::navigation::ListArrival;
use daybook_core::picker::Anchor;
use daybook_core::view::ListView;
use daybook_core::{
  DateField,
  EditError,
  Filter,
  TaskBook,
  TaskEdit
};
use web_sys::{
  Event,
  HtmlInputElement,
  HtmlSelectElement,
  InputEvent,
  KeyboardEvent
};
use yew::{
  Callback,
  Html,
  TargetCast,
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
  Route,
  commit_book
};
use crate::components::{
  DatePickerPopup,
  TaskRow,
  ui_text
};

#[function_component(ListPage)]
pub fn list_page() -> Html {
  let Some(ctx) =
    use_context::<AppContext>()
  else {
    tracing::error!(
      "list page rendered without app context"
    );
    return html! {};
  };
  let navigator = use_navigator();
  let location = use_location();
  let today = ctx.config.today();
  let locale = ctx.config.locale;
  let week_start =
    ctx.config.week_start();
  let text = ui_text(locale);

  let view = {
    let arrival = location
      .as_ref()
      .and_then(|loc| {
        loc.state::<ListArrival>()
      });
    use_state(move || {
      let mut view = ListView::new(today);
      if let Some(arrival) = arrival {
        view.apply_arrival(&arrival);
      }
      view
    })
  };
  let book =
    use_state(|| None::<TaskBook>);

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

  // Runs `change` against the loaded book and saves the result when it
  // reports a mutation. Nothing is saved before the first load completes.
  let mutate = {
    let book = book.clone();
    let store = Rc::clone(&ctx.store);
    Rc::new(
      move |change: &dyn Fn(
        &mut TaskBook
      ) -> bool| {
        let Some(current) = &*book else {
          tracing::debug!(
            "ignoring edit before tasks loaded"
          );
          return;
        };
        let mut next = current.clone();
        if change(&mut next) {
          commit_book(&book, &store, next);
        }
      }
    )
  };

  let on_prev_day = {
    let view = view.clone();
    Callback::from(move |_| {
      let mut next = (*view).clone();
      next.step_day(-1);
      view.set(next);
    })
  };
  let on_next_day = {
    let view = view.clone();
    Callback::from(move |_| {
      let mut next = (*view).clone();
      next.step_day(1);
      view.set(next);
    })
  };

  let on_to_calendar = {
    let view = view.clone();
    let navigator = navigator.clone();
    Callback::from(move |_| {
      let mut next = (*view).clone();
      let arrival = next.to_calendar();
      view.set(next);
      match &navigator {
        | Some(navigator) => {
          navigator.push_with_state(
            &Route::Calendar,
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

  let on_filter = {
    let view = view.clone();
    Callback::from(move |e: Event| {
      let select: HtmlSelectElement =
        e.target_unchecked_into();
      match Filter::from_str(
        &select.value()
      ) {
        | Ok(filter) => {
          let mut next = (*view).clone();
          next.filter = filter;
          view.set(next);
        }
        | Err(error) => {
          tracing::warn!(error = %error, "ignoring filter value")
        }
      }
    })
  };

  let on_draft = {
    let view = view.clone();
    Callback::from(
      move |e: InputEvent| {
        let input: HtmlInputElement =
          e.target_unchecked_into();
        let mut next = (*view).clone();
        next.draft = input.value();
        view.set(next);
      }
    )
  };

  let submit = {
    let view = view.clone();
    let book = book.clone();
    let store = Rc::clone(&ctx.store);
    Rc::new(move || {
      let Some(current) = &*book else {
        return;
      };
      let mut next_view =
        (*view).clone();
      let mut next_book = current.clone();
      if let Some(id) =
        next_view.submit(&mut next_book, today)
      {
        tracing::info!(task_id = id, "created task");
        commit_book(
          &book, &store, next_book
        );
        view.set(next_view);
      }
    })
  };

  let on_draft_key = {
    let submit = Rc::clone(&submit);
    Callback::from(
      move |e: KeyboardEvent| {
        if e.key() == "Enter" {
          submit();
        }
      }
    )
  };
  let on_add = {
    let submit = Rc::clone(&submit);
    Callback::from(move |_| submit())
  };

  let on_empty_trash = {
    let mutate = Rc::clone(&mutate);
    Callback::from(move |_| {
      mutate(&|book: &mut TaskBook| {
        book.empty_trash() > 0
      })
    })
  };

  let on_edit = {
    let mutate = Rc::clone(&mutate);
    Callback::from(
      move |(id, edit): (u64, TaskEdit)| {
        mutate(&|book: &mut TaskBook| {
          match book.apply(id, edit.clone())
          {
            | Ok(()) => true,
            | Err(error) => {
              tracing::warn!(task_id = id, %error, "edit rejected");
              false
            }
          }
        })
      }
    )
  };

  let on_toggle_deleted = {
    let mutate = Rc::clone(&mutate);
    Callback::from(move |id: u64| {
      mutate(&|book: &mut TaskBook| {
        match book.toggle_deleted(id) {
          | Ok(deleted) => {
            tracing::info!(task_id = id, deleted, "toggled trash");
            true
          }
          | Err(error) => {
            tracing::warn!(task_id = id, %error, "toggle rejected");
            false
          }
        }
      })
    })
  };

  let on_toggle_expand = {
    let view = view.clone();
    Callback::from(move |id: u64| {
      let mut next = (*view).clone();
      next.toggle_expand(id);
      view.set(next);
    })
  };

  let on_date_click = {
    let view = view.clone();
    let book = book.clone();
    Callback::from(
      move |(id, field, anchor): (
        u64,
        DateField,
        Anchor
      )| {
        let Some(current) = &*book else {
          return;
        };
        let mut next = (*view).clone();
        next.open_picker(
          current, id, field, anchor
        );
        view.set(next);
      }
    )
  };

  let on_pick = {
    let view = view.clone();
    let book = book.clone();
    let store = Rc::clone(&ctx.store);
    Callback::from(
      move |date: NaiveDate| {
        let Some(current) = &*book else {
          return;
        };
        let mut next_view =
          (*view).clone();
        let mut next_book =
          current.clone();
        match next_view
          .picker
          .select(&mut next_book, date)
        {
          | Ok(Some(picked)) => {
            tracing::info!(
              task_id = picked.task_id,
              field = ?picked.field,
              date = %picked.date,
              "date picked"
            );
            commit_book(
              &book, &store, next_book
            );
          }
          | Ok(None) => {}
          | Err(
            EditError::DueBeforeStart {
              ..
            }
          ) => {
            gloo::dialogs::alert(
              text.due_before_start
            );
          }
          | Err(_) => {}
        }
        view.set(next_view);
      }
    )
  };

  let on_picker_prev = {
    let view = view.clone();
    Callback::from(move |()| {
      let mut next = (*view).clone();
      if next.picker.prev_month(today) {
        view.set(next);
      }
    })
  };
  let on_picker_next = {
    let view = view.clone();
    Callback::from(move |()| {
      let mut next = (*view).clone();
      next.picker.next_month();
      view.set(next);
    })
  };

  let picker = match (
    view.picker.session(),
    view.picker.grid(today, week_start)
  ) {
    | (Some(session), Some(grid)) => {
      html! {
          <DatePickerPopup
              grid={grid}
              anchor={session.anchor}
              locale={locale}
              week_start={week_start}
              on_pick={on_pick}
              on_prev={on_picker_prev}
              on_next={on_picker_next}
          />
      }
    }
    | _ => html! {}
  };

  let composer = if view.filter
    == Filter::Trash
  {
    html! {
        <button type="button" class="danger" onclick={on_empty_trash}>
            { text.empty_trash }
        </button>
    }
  } else {
    html! {
        <div class="composer">
            <input
                type="text"
                value={view.draft.clone()}
                oninput={on_draft}
                onkeydown={on_draft_key}
            />
            <button type="button" class="primary" onclick={on_add}>
                { text.add }
            </button>
        </div>
    }
  };

  let rows = match &*book {
    | None => {
      html! { <div class="loading">{ text.loading }</div> }
    }
    | Some(current) => {
      html! {
          <div class="task-list">
              {
                  for view.visible(current).into_iter().map(|task| {
                      let editing = view
                          .picker
                          .session()
                          .filter(|s| s.task_id == task.id)
                          .map(|s| s.field);
                      html! {
                          <TaskRow
                              key={task.id}
                              task={task.clone()}
                              locale={locale}
                              expanded={view.is_expanded(task.id)}
                              editing={editing}
                              on_edit={on_edit.clone()}
                              on_date_click={on_date_click.clone()}
                              on_toggle_expand={on_toggle_expand.clone()}
                              on_toggle_deleted={on_toggle_deleted.clone()}
                          />
                      }
                  })
              }
          </div>
      }
    }
  };

  html! {
      <div class="list-page">
          <div class="day-heading">{ view.heading(locale) }</div>
          <div class="day-actions">
              <button type="button" class="primary" onclick={on_prev_day}>{ text.prev_day }</button>
              <button type="button" class="primary" onclick={on_to_calendar}>{ text.to_calendar }</button>
              <button type="button" class="primary" onclick={on_next_day}>{ text.next_day }</button>
          </div>
          { picker }
          <div class="filter-bar">
              <select onchange={on_filter}>
                  {
                      for Filter::ALL.into_iter().map(|filter| html! {
                          <option
                              value={filter.as_key()}
                              selected={filter == view.filter}
                          >
                              { filter.label(locale) }
                          </option>
                      })
                  }
              </select>
          </div>
          { composer }
          { rows }
      </div>
  }
}
