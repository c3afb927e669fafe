use daybook_core::book::TaskEdit;
use daybook_core::config::Locale;
use daybook_core::datetime::format_iso_date;
use daybook_core::picker::Anchor;
use daybook_core::task::{
  DateField,
  PROGRESS_STEPS,
  Task
};
use web_sys::{
  Event,
  HtmlInputElement,
  HtmlSelectElement,
  HtmlTextAreaElement,
  InputEvent,
  MouseEvent
};
use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  classes,
  function_component,
  html
};

use super::ui_text;

#[derive(Properties, PartialEq)]
pub struct TaskRowProps {
  pub task:              Task,
  pub locale:            Locale,
  pub expanded:          bool,
  pub editing:           Option<DateField>,
  pub on_edit:
    Callback<(u64, TaskEdit)>,
  pub on_date_click:
    Callback<(u64, DateField, Anchor)>,
  pub on_toggle_expand:  Callback<u64>,
  pub on_toggle_deleted: Callback<u64>
}

/// Page coordinates just below the clicked element.
fn anchor_below(
  event: &MouseEvent
) -> Anchor {
  let Some(element) = event
    .target_dyn_into::<web_sys::Element>()
  else {
    return Anchor::default();
  };
  let rect =
    element.get_bounding_client_rect();
  let (scroll_x, scroll_y) =
    web_sys::window()
      .map(|window| {
        (
          window.scroll_x().unwrap_or(0.0),
          window.scroll_y().unwrap_or(0.0)
        )
      })
      .unwrap_or((0.0, 0.0));

  Anchor {
    top:  rect.bottom() + scroll_y,
    left: rect.left() + scroll_x
  }
}

#[function_component(TaskRow)]
pub fn task_row(
  props: &TaskRowProps
) -> Html {
  let text = ui_text(props.locale);
  let task = &props.task;
  let id = task.id;
  let locked = task.deleted;

  let on_progress = {
    let on_edit = props.on_edit.clone();
    Callback::from(move |e: Event| {
      let select: HtmlSelectElement =
        e.target_unchecked_into();
      match select.value().parse::<u32>()
      {
        | Ok(progress) => {
          on_edit.emit((
            id,
            TaskEdit::Progress(progress)
          ))
        }
        | Err(error) => {
          tracing::warn!(task_id = id, %error, "ignoring progress value")
        }
      }
    })
  };

  let on_title = {
    let on_edit = props.on_edit.clone();
    Callback::from(
      move |e: InputEvent| {
        let input: HtmlInputElement =
          e.target_unchecked_into();
        on_edit.emit((
          id,
          TaskEdit::Title(input.value())
        ));
      }
    )
  };

  let on_detail = {
    let on_edit = props.on_edit.clone();
    Callback::from(
      move |e: InputEvent| {
        let area: HtmlTextAreaElement =
          e.target_unchecked_into();
        on_edit.emit((
          id,
          TaskEdit::Detail(area.value())
        ));
      }
    )
  };

  let date_input =
    |field: DateField, label: &str| {
      let on_date_click =
        props.on_date_click.clone();
      let active =
        props.editing == Some(field);
      html! {
          <div class="date-field">
              <label>{ label.to_string() }</label>
              <input
                  type="text"
                  readonly=true
                  disabled={locked}
                  class={classes!(active.then_some("editing"))}
                  value={format_iso_date(task.date(field))}
                  onclick={Callback::from(move |e: MouseEvent| {
                      if !locked {
                          on_date_click.emit((id, field, anchor_below(&e)));
                      }
                  })}
              />
          </div>
      }
    };

  let on_toggle_expand = {
    let on_toggle_expand =
      props.on_toggle_expand.clone();
    Callback::from(move |_| {
      on_toggle_expand.emit(id)
    })
  };
  let on_toggle_deleted = {
    let on_toggle_deleted =
      props.on_toggle_deleted.clone();
    Callback::from(move |_| {
      on_toggle_deleted.emit(id)
    })
  };

  html! {
      <div class={classes!("task-row", locked.then_some("trashed"), task.is_completed().then_some("done"))}>
          <div class="task-row-main">
              <div class="progress-field">
                  <label>{ text.progress }</label>
                  <select disabled={locked} onchange={on_progress}>
                      {
                          for PROGRESS_STEPS.iter().map(|step| html! {
                              <option
                                  value={step.to_string()}
                                  selected={*step == task.progress}
                              >
                                  { format!("{step}%") }
                              </option>
                          })
                      }
                  </select>
              </div>
              <div class="date-fields">
                  { date_input(DateField::Start, text.start_date) }
                  { date_input(DateField::Due, text.due_date) }
              </div>
              <input
                  type="text"
                  class="task-title"
                  disabled={locked}
                  value={task.title.clone()}
                  oninput={on_title}
              />
              <button type="button" onclick={on_toggle_expand}>
                  { text.edit }
              </button>
              <button type="button" onclick={on_toggle_deleted}>
                  { if locked { text.restore } else { text.delete } }
              </button>
          </div>
          if props.expanded {
              <div class="task-row-detail">
                  <textarea
                      disabled={locked}
                      value={task.detail.clone()}
                      oninput={on_detail}
                  />
              </div>
          }
      </div>
  }
}
