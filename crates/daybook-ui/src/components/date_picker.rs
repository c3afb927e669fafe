use chrono::{
  Datelike,
  NaiveDate,
  Weekday
};
use daybook_core::config::Locale;
use daybook_core::datetime::weekday_labels;
use daybook_core::picker::{
  Anchor,
  PickerGrid
};
use yew::{
  Callback,
  Html,
  Properties,
  classes,
  function_component,
  html
};

use super::weekday_class;

#[derive(Properties, PartialEq)]
pub struct DatePickerPopupProps {
  pub grid:       PickerGrid,
  pub anchor:     Anchor,
  pub locale:     Locale,
  pub week_start: Weekday,
  pub on_pick:    Callback<NaiveDate>,
  pub on_prev:    Callback<()>,
  pub on_next:    Callback<()>
}

fn popup_style(anchor: Anchor) -> String {
  format!(
    "position: absolute; top: {}px; \
     left: {}px;",
    anchor.top, anchor.left
  )
}

#[function_component(DatePickerPopup)]
pub fn date_picker_popup(
  props: &DatePickerPopupProps
) -> Html {
  let grid = &props.grid;
  let labels = weekday_labels(
    props.week_start,
    props.locale
  );
  let mut label_day = props.week_start;

  let on_prev = {
    let on_prev = props.on_prev.clone();
    Callback::from(move |_| {
      on_prev.emit(())
    })
  };
  let on_next = {
    let on_next = props.on_next.clone();
    Callback::from(move |_| {
      on_next.emit(())
    })
  };

  html! {
      <div class="date-picker" style={popup_style(props.anchor)}>
          <div class="date-picker-header">
              if grid.can_go_prev {
                  <button type="button" class="date-picker-nav" onclick={on_prev}>{ "←" }</button>
              } else {
                  <span class="date-picker-nav-spacer" />
              }
              <div class="date-picker-title">{ grid.month.label(props.locale) }</div>
              <button type="button" class="date-picker-nav" onclick={on_next}>{ "→" }</button>
          </div>
          <div class="date-picker-weekdays">
              {
                  for labels.into_iter().map(|label| {
                      let weekday = label_day;
                      label_day = label_day.succ();
                      html! {
                          <div class={classes!("date-picker-weekday", weekday_class(weekday))}>{ label }</div>
                      }
                  })
              }
          </div>
          <div class="date-picker-days">
              { for (0..grid.leading_blanks).map(|_| html! { <div class="date-picker-blank" /> }) }
              {
                  for grid.days.iter().map(|day| {
                      let date = day.date;
                      let on_pick = props.on_pick.clone();
                      html! {
                          <button
                              type="button"
                              class={classes!(
                                  "date-picker-day",
                                  weekday_class(day.weekday),
                                  day.is_today.then_some("today")
                              )}
                              onclick={Callback::from(move |_| on_pick.emit(date))}
                          >
                              { date.day() }
                          </button>
                      }
                  })
              }
          </div>
      </div>
  }
}
