use std::rc::Rc;

use chrono::Datelike;
use daybook_core::calendar::{
  CalendarCallbacks,
  CalendarRender,
  DayCell,
  MonthLayout
};
use daybook_core::datetime::{
  YearMonth,
  weekday_labels
};
use web_sys::MouseEvent;
use yew::{
  Callback,
  Html,
  Properties,
  classes,
  function_component,
  html,
  use_state
};

use super::{
  ui_text,
  weekday_class
};

/// A render request together with the callbacks it was mounted with.
pub struct MountedCalendar {
  pub request:   CalendarRender,
  pub callbacks: CalendarCallbacks
}

impl PartialEq for MountedCalendar {
  fn eq(&self, other: &Self) -> bool {
    std::ptr::eq(self, other)
  }
}

#[derive(Properties, PartialEq)]
pub struct MonthGridProps {
  pub calendar: Rc<MountedCalendar>
}

fn overflow_label(
  cell: &DayCell
) -> Option<String> {
  (cell.overflow > 0)
    .then(|| format!("+{}", cell.overflow))
}

#[function_component(MonthGrid)]
pub fn month_grid(
  props: &MonthGridProps
) -> Html {
  let request = &props.calendar.request;
  let text = ui_text(request.locale);
  let initial =
    YearMonth::of(request.initial_date);
  let focus = use_state(|| initial);

  let layout = MonthLayout::build(
    *focus,
    request.week_start,
    &request.events,
    request.day_max_events,
    request.today
  );
  let labels = weekday_labels(
    request.week_start,
    request.locale
  );

  let shift = |months: i32| {
    let focus = focus.clone();
    Callback::from(move |_| {
      focus.set(focus.shift(months));
    })
  };
  let on_today = {
    let focus = focus.clone();
    let today =
      YearMonth::of(request.today);
    Callback::from(move |_| {
      focus.set(today)
    })
  };

  let render_cell = |cell: &DayCell| {
    let date = cell.date;
    let calendar =
      Rc::clone(&props.calendar);
    let on_cell = Callback::from(
      move |_: MouseEvent| {
        (calendar.callbacks.on_date_click)(
          date
        )
      }
    );

    html! {
        <div
            class={classes!(
                "month-cell",
                weekday_class(cell.weekday),
                (!cell.in_month).then_some("outside"),
                cell.is_today.then_some("today")
            )}
            onclick={on_cell}
        >
            <div class="month-cell-day">{ cell.date.day() }</div>
            {
                for cell.events.iter().map(|event| {
                    let event_id = event.id.clone();
                    let calendar = Rc::clone(&props.calendar);
                    let style = format!(
                        "background-color: {}; border-color: {}; color: {};",
                        event.background_color, event.border_color, event.text_color
                    );
                    html! {
                        <div
                            class="month-event"
                            style={style}
                            onclick={Callback::from(move |e: MouseEvent| {
                                e.stop_propagation();
                                (calendar.callbacks.on_event_click)(event_id.clone());
                            })}
                        >
                            { event.title.clone() }
                        </div>
                    }
                })
            }
            if let Some(more) = overflow_label(cell) {
                <div class="month-more">{ more }</div>
            }
        </div>
    }
  };

  html! {
      <div class="month-grid">
          <div class="month-toolbar">
              <button type="button" onclick={shift(-1)}>{ "←" }</button>
              <button type="button" onclick={on_today}>{ text.today }</button>
              <button type="button" onclick={shift(1)}>{ "→" }</button>
              <div class="month-title">{ layout.month.label(request.locale) }</div>
          </div>
          <div class="month-weekdays">
              {
                  for labels.into_iter().zip(layout.weeks.first().into_iter().flatten()).map(|(label, cell)| html! {
                      <div class={classes!("month-weekday", weekday_class(cell.weekday))}>{ label }</div>
                  })
              }
          </div>
          {
              for layout.weeks.iter().map(|week| html! {
                  <div class="month-week">
                      { for week.iter().map(&render_cell) }
                  </div>
              })
          }
      </div>
  }
}
