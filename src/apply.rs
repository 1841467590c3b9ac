//! Query applicator: turns a query into UI interactions
//!
//! Every step here is best-effort by design. The target site is not under
//! our control and may reorder or rename its controls at any time; a missing
//! mood button must not stop the genre chips or the submit click. Each step
//! tries an ordered list of lookup strategies and reports success as a bool
//! instead of an error.

use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::extract::RESULTS_HEADING;
use crate::query::{Genre, Mood, MusicQuery};
use crate::session::wait_for_text;
use crate::Config;

/// Visible label of the search submit button.
pub const SUBMIT_LABEL: &str = "Find My Music";

/// Slider order on the page: energy first, happiness second.
pub const ENERGY_SLIDER_INDEX: usize = 0;
pub const HAPPINESS_SLIDER_INDEX: usize = 1;

const POINTER_DRAG_STEPS: u32 = 10;

/// One planned UI interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    SelectMood(Mood),
    SetSlider { index: usize, percent: u8 },
    ToggleGenre(Genre),
    Submit,
    AwaitResults,
}

/// Translate a query into the ordered interaction sequence.
///
/// A query with no filters still submits and waits; it just skips every
/// filter interaction.
pub fn interaction_plan(query: &MusicQuery) -> Vec<Step> {
    let mut steps = Vec::new();

    if let Some(mood) = query.mood() {
        steps.push(Step::SelectMood(mood));
    }
    if let Some(percent) = query.energy_level() {
        steps.push(Step::SetSlider {
            index: ENERGY_SLIDER_INDEX,
            percent,
        });
    }
    if let Some(percent) = query.happiness_level() {
        steps.push(Step::SetSlider {
            index: HAPPINESS_SLIDER_INDEX,
            percent,
        });
    }
    for genre in query.genres() {
        steps.push(Step::ToggleGenre(*genre));
    }
    steps.push(Step::Submit);
    steps.push(Step::AwaitResults);

    steps
}

/// Execute the interaction plan against a navigated page.
///
/// Infallible: a failed step is logged and the remaining steps still run.
pub async fn apply(page: &Page, query: &MusicQuery, config: &Config) {
    for step in interaction_plan(query) {
        let ok = match &step {
            Step::SelectMood(mood) => select_mood(page, *mood).await,
            Step::SetSlider { index, percent } => set_slider(page, *index, *percent).await,
            Step::ToggleGenre(genre) => toggle_genre(page, *genre).await,
            Step::Submit => submit(page).await,
            Step::AwaitResults => await_results(page, config).await,
        };
        if ok {
            trace!("Step succeeded: {:?}", step);
        } else {
            debug!("Step had no effect, continuing: {:?}", step);
        }
    }
}

/// Click the mood button: role-based lookup first, plain-text scan second.
async fn select_mood(page: &Page, mood: Mood) -> bool {
    if click_button_with_text(page, mood.label()).await {
        return true;
    }
    click_by_text(page, mood.label(), true).await
}

/// Click a genre chip by its lower-cased label: container-text match first,
/// generic text match second.
async fn toggle_genre(page: &Page, genre: Genre) -> bool {
    let label = genre.click_label();
    if click_by_text_in(page, "div", &label, false).await {
        return true;
    }
    click_by_text(page, &label, false).await
}

async fn submit(page: &Page) -> bool {
    if click_button_with_text(page, SUBMIT_LABEL).await {
        return true;
    }
    click_by_text(page, SUBMIT_LABEL, true).await
}

/// Wait for the results heading, then a settle delay for asynchronous
/// rendering. If the heading never shows, wait one longer fixed delay and
/// proceed anyway so extraction still gets a chance.
async fn await_results(page: &Page, config: &Config) -> bool {
    let timeout = Duration::from_millis(config.results_timeout_ms);
    match wait_for_text(page, RESULTS_HEADING, timeout).await {
        Ok(()) => {
            tokio::time::sleep(Duration::from_millis(config.settle_delay_ms)).await;
            true
        }
        Err(e) => {
            debug!("Results heading never appeared ({}), degrading to fixed delay", e);
            tokio::time::sleep(Duration::from_millis(config.fallback_delay_ms)).await;
            false
        }
    }
}

/// Find a button (or button-role element) whose trimmed text equals `label`
/// and click it through CDP.
async fn click_button_with_text(page: &Page, label: &str) -> bool {
    let candidates = match page
        .find_elements("button, [role='button'], input[type='submit']")
        .await
    {
        Ok(els) => els,
        Err(e) => {
            trace!("Button lookup failed: {}", e);
            return false;
        }
    };

    for el in candidates {
        let text = match el.inner_text().await {
            Ok(Some(t)) => t,
            _ => continue,
        };
        if text.trim() == label {
            return click_element(page, &el).await;
        }
    }
    false
}

/// Scroll into view and click at the element's clickable point.
async fn click_element(page: &Page, el: &Element) -> bool {
    if let Err(e) = el.scroll_into_view().await {
        trace!("scroll_into_view failed: {}", e);
    }
    let point = match el.clickable_point().await {
        Ok(p) => p,
        Err(e) => {
            trace!("No clickable point: {}", e);
            return false;
        }
    };
    match page.click(point).await {
        Ok(_) => true,
        Err(e) => {
            trace!("Click failed: {}", e);
            false
        }
    }
}

/// Click the first element matching `selector` whose text matches `label`.
/// Runs in page JavaScript so text matching covers the whole subtree.
async fn click_by_text_in(page: &Page, selector: &str, label: &str, exact: bool) -> bool {
    let expr = format!(
        r#"(() => {{
            const label = {label:?}.toLowerCase();
            const els = Array.from(document.querySelectorAll({selector:?}));
            const el = els.find(e => {{
                const text = (e.innerText || '').trim().toLowerCase();
                return {exact} ? text === label : (text.includes(label) && text.length < 80);
            }});
            if (!el) return false;
            el.click();
            return true;
        }})()"#
    );

    match page.evaluate(expr.as_str()).await {
        Ok(result) => result.into_value::<bool>().unwrap_or(false),
        Err(e) => {
            trace!("Text click evaluation failed: {}", e);
            false
        }
    }
}

async fn click_by_text(page: &Page, label: &str, exact: bool) -> bool {
    click_by_text_in(page, "*", label, exact).await
}

#[derive(Debug, Deserialize)]
struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Set the nth slider to a percentage.
///
/// Primary strategy is a pointer press-move-release drag across the track.
/// Fallback is focusing the control and nudging with arrow keys from its
/// current value (read from `aria-valuenow` or `value`; only when neither is
/// exposed do we assume the site's default midpoint of 50).
async fn set_slider(page: &Page, index: usize, percent: u8) -> bool {
    let sliders = match page
        .find_elements("[role='slider'], input[type='range']")
        .await
    {
        Ok(els) => els,
        Err(e) => {
            trace!("Slider lookup failed: {}", e);
            return false;
        }
    };
    let Some(el) = sliders.get(index) else {
        debug!("No slider at index {}", index);
        return false;
    };

    if drag_slider(page, el, percent).await {
        return true;
    }
    nudge_slider(el, percent).await
}

async fn drag_slider(page: &Page, el: &Element, percent: u8) -> bool {
    let rect = match element_rect(el).await {
        Some(r) if r.width > 0.0 => r,
        _ => return false,
    };

    let y = rect.y + rect.height / 2.0;
    let start_x = rect.x + rect.width / 2.0;
    let target_x = rect.x + rect.width * (f64::from(percent) / 100.0);

    if dispatch_mouse(page, DispatchMouseEventType::MouseMoved, start_x, y, false)
        .await
        .is_err()
    {
        return false;
    }
    if dispatch_mouse(page, DispatchMouseEventType::MousePressed, start_x, y, true)
        .await
        .is_err()
    {
        return false;
    }

    // Interpolated moves so the site's drag handlers see a gesture, not a jump.
    for step in 1..=POINTER_DRAG_STEPS {
        let t = f64::from(step) / f64::from(POINTER_DRAG_STEPS);
        let x = start_x + (target_x - start_x) * t;
        if dispatch_mouse(page, DispatchMouseEventType::MouseMoved, x, y, true)
            .await
            .is_err()
        {
            break;
        }
    }

    dispatch_mouse(page, DispatchMouseEventType::MouseReleased, target_x, y, true)
        .await
        .is_ok()
}

async fn dispatch_mouse(
    page: &Page,
    event_type: DispatchMouseEventType,
    x: f64,
    y: f64,
    left_button: bool,
) -> Result<(), String> {
    let mut builder = DispatchMouseEventParams::builder()
        .r#type(event_type)
        .x(x)
        .y(y);
    if left_button {
        builder = builder.button(MouseButton::Left).click_count(1);
    }
    let params = builder.build().map_err(|e| e.to_string())?;

    page.execute(params).await.map_err(|e| {
        trace!("Mouse event dispatch failed: {}", e);
        e.to_string()
    })?;
    Ok(())
}

async fn element_rect(el: &Element) -> Option<Rect> {
    let returns = el
        .call_js_fn(
            "function() { \
                const r = this.getBoundingClientRect(); \
                return { x: r.x, y: r.y, width: r.width, height: r.height }; \
             }",
            false,
        )
        .await
        .ok()?;
    let value = returns.result.value?;
    serde_json::from_value(value).ok()
}

/// Read the slider's current value if the control exposes one.
async fn slider_current_value(el: &Element) -> Option<u8> {
    if let Ok(Some(v)) = el.attribute("aria-valuenow").await {
        if let Ok(n) = v.trim().parse::<f64>() {
            return Some(n.clamp(0.0, 100.0) as u8);
        }
    }
    let returns = el
        .call_js_fn("function() { return this.value ?? null; }", false)
        .await
        .ok()?;
    let value = returns.result.value?;
    let n = match value {
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        serde_json::Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    Some(n.clamp(0.0, 100.0) as u8)
}

async fn nudge_slider(el: &Element, percent: u8) -> bool {
    if el.focus().await.is_err() {
        return false;
    }

    let current = slider_current_value(el).await.unwrap_or(50);
    let delta = i16::from(percent) - i16::from(current);
    let key = if delta > 0 { "ArrowRight" } else { "ArrowLeft" };

    for _ in 0..delta.unsigned_abs() {
        if el.press_key(key).await.is_err() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::MusicQuery;

    #[test]
    fn empty_query_still_submits_and_waits() {
        let plan = interaction_plan(&MusicQuery::empty());
        assert_eq!(plan, vec![Step::Submit, Step::AwaitResults]);
    }

    #[test]
    fn full_query_plans_every_interaction_in_order() {
        let query = MusicQuery::new(
            Some(Mood::Happy),
            Some(75),
            Some(80),
            vec![Genre::Pop, Genre::Electronic],
        )
        .unwrap();

        let plan = interaction_plan(&query);
        assert_eq!(
            plan,
            vec![
                Step::SelectMood(Mood::Happy),
                Step::SetSlider {
                    index: ENERGY_SLIDER_INDEX,
                    percent: 75
                },
                Step::SetSlider {
                    index: HAPPINESS_SLIDER_INDEX,
                    percent: 80
                },
                Step::ToggleGenre(Genre::Pop),
                Step::ToggleGenre(Genre::Electronic),
                Step::Submit,
                Step::AwaitResults,
            ]
        );
    }

    #[test]
    fn happiness_alone_targets_second_slider() {
        let query = MusicQuery::new(None, None, Some(30), vec![]).unwrap();
        let plan = interaction_plan(&query);
        assert_eq!(
            plan[0],
            Step::SetSlider {
                index: HAPPINESS_SLIDER_INDEX,
                percent: 30
            }
        );
    }
}
