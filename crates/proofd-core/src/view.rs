//! Declarative popup view built from a config and a purchase. Nothing here
//! touches a display; the popup client decides how to materialize it.

use crate::config::{Config, Shape};
use crate::event::{format_currency, PurchaseEvent};
use crate::position::Placement;
use crate::template::{escape_html, render_template, Markup, Substitutions};
use crate::time_format::format_time;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::{self, Write as _};

const IMAGE_PLACEHOLDER_BG: &str = "#f0f0f0";
const IMAGE_BORDER: &str = "1px solid #e1e3e5";
const MUTED_ALPHA: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerStyle {
    pub background: String,
    pub color: String,
    pub font_family: String,
    pub font_size: String,
    pub max_width: String,
    pub border_radius: String,
    pub shadow: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlock {
    pub size: String,
    pub border_radius: String,
    pub border: Option<String>,
    pub background: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloseControl {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeAgo {
    pub text: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub placement: Placement,
    pub container: ContainerStyle,
    pub close: Option<CloseControl>,
    pub image: Option<ImageBlock>,
    pub message: Markup,
    pub price: Option<String>,
    pub time_ago: Option<TimeAgo>,
}

fn radius(shape: Shape, rounded: &str) -> String {
    match shape {
        Shape::Rounded => rounded.to_string(),
        Shape::Square => "0".to_string(),
    }
}

/// Build the view for `event`, with time-ago text relative to `now`.
pub fn build<Tz>(config: &Config, event: &PurchaseEvent, now: &DateTime<Tz>) -> ViewModel
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let display = &config.display;
    let style = &config.style;
    let muted = style.text_color.with_alpha(MUTED_ALPHA).to_paint_string();

    let price = format_currency(event.price);
    let message = render_template(
        &config.text.template,
        &Substitutions {
            customer: &event.customer,
            location: &event.location,
            product: &event.product,
            price: &price,
        },
    );

    let time_ago = display.show_time_ago.then(|| {
        let timestamp = event.timestamp.with_timezone(&now.timezone());
        TimeAgo {
            text: format_time(&timestamp, now, config.text.time_ago_format),
            color: muted.clone(),
        }
    });

    let image = display.show_image.then(|| ImageBlock {
        size: display.image_size.clone(),
        border_radius: radius(display.image_shape, "8px"),
        border: display.image_border.then(|| IMAGE_BORDER.to_string()),
        background: IMAGE_PLACEHOLDER_BG.to_string(),
    });

    let close = display.allow_close.then(|| CloseControl {
        label: "\u{d7}".to_string(),
        color: muted.clone(),
    });

    ViewModel {
        placement: display.position.placement(),
        container: ContainerStyle {
            background: style.background_color.to_paint_string(),
            color: style.text_color.to_paint_string(),
            font_family: style.font_family.clone(),
            font_size: style.font_size.clone(),
            max_width: display.max_width.clone(),
            border_radius: radius(display.popup_shape, &style.border_radius),
            shadow: style.shadow.clone(),
        },
        close,
        image,
        message,
        price: display.show_price.then_some(price),
        time_ago,
    }
}

/// Same as [`build`] with UTC as the display zone.
pub fn build_utc(config: &Config, event: &PurchaseEvent, now: DateTime<Utc>) -> ViewModel {
    build(config, event, &now)
}

impl ViewModel {
    /// Render as a self-contained HTML fragment, positioned at its resting
    /// place (animation offsets are applied by the caller).
    pub fn to_html(&self) -> String {
        let c = &self.container;
        let p = &self.placement;
        let mut out = String::new();
        let _ = write!(
            out,
            "<div class=\"proofd-popup\" style=\"position:fixed;{}:{}px;{}:{}px;max-width:{};\
             font-family:{};font-size:{};background-color:{};color:{};border-radius:{};\
             box-shadow:{};padding:15px;z-index:1000\">",
            p.vertical.css_property(),
            p.margin_px,
            p.horizontal.css_property(),
            p.margin_px,
            escape_html(&c.max_width),
            escape_html(&c.font_family),
            escape_html(&c.font_size),
            c.background,
            c.color,
            escape_html(&c.border_radius),
            escape_html(&c.shadow),
        );
        out.push_str("<div style=\"display:flex;align-items:center;gap:12px;position:relative\">");

        if let Some(close) = &self.close {
            let _ = write!(
                out,
                "<button aria-label=\"Close notification\" style=\"position:absolute;top:-4px;right:-4px;\
                 border:none;background:transparent;color:{}\">{}</button>",
                close.color, close.label
            );
        }

        if let Some(image) = &self.image {
            let border = image
                .border
                .as_deref()
                .map(|b| format!("border:{b};"))
                .unwrap_or_default();
            let _ = write!(
                out,
                "<div style=\"width:{size};height:{size};background-color:{};border-radius:{};{}\"></div>",
                image.background,
                escape_html(&image.border_radius),
                border,
                size = escape_html(&image.size),
            );
        }

        out.push_str("<div style=\"flex:1;min-width:0;line-height:1.4\">");
        out.push_str(&self.message.to_html());
        if let Some(price) = &self.price {
            let _ = write!(out, " <span class=\"proofd-price\">{}</span>", escape_html(price));
        }
        if let Some(time_ago) = &self.time_ago {
            let _ = write!(
                out,
                "<div style=\"color:{};font-size:0.85em;margin-top:4px\">{}</div>",
                time_ago.color,
                escape_html(&time_ago.text)
            );
        }
        out.push_str("</div></div></div>");
        out
    }

    /// One-line text rendering, used for logs and terminal previews.
    pub fn summary(&self) -> String {
        let mut line = self.message.plain_text();
        if let Some(price) = &self.price {
            line.push_str(" · ");
            line.push_str(price);
        }
        if let Some(time_ago) = &self.time_ago {
            line.push_str(" · ");
            line.push_str(&time_ago.text);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Color;
    use crate::position::{Horizontal, Position, Vertical};
    use crate::template::SpanStyle;
    use crate::time_format::TimeFormat;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn event() -> PurchaseEvent {
        PurchaseEvent {
            customer: "Emma".into(),
            location: "Toronto".into(),
            product: "Backpack".into(),
            price: 59.99,
            timestamp: now() - chrono::Duration::minutes(3),
        }
    }

    #[test]
    fn default_config_builds_full_view() {
        let view = build_utc(&Config::default(), &event(), now());
        assert_eq!(view.message.source(), "Emma from Toronto just purchased Backpack");
        assert_eq!(view.price.as_deref(), Some("$59.99"));
        assert_eq!(view.time_ago.as_ref().map(|t| t.text.as_str()), Some("3 minutes ago"));
        assert!(view.image.is_some());
        assert!(view.close.is_some());
    }

    #[test]
    fn optional_blocks_follow_display_flags() {
        let mut config = Config::default();
        config.display.show_image = false;
        config.display.show_time_ago = false;
        config.display.show_price = false;
        config.display.allow_close = false;
        let view = build_utc(&config, &event(), now());
        assert!(view.image.is_none());
        assert!(view.time_ago.is_none());
        assert!(view.price.is_none());
        assert!(view.close.is_none());
    }

    #[test]
    fn price_placeholder_uses_currency_format() {
        let mut config = Config::default();
        config.text.template = "*{product}* for {price}".into();
        let view = build_utc(&config, &event(), now());
        let spans: Vec<_> = view.message.spans().collect();
        assert_eq!(spans[0].style, SpanStyle::Bold);
        assert_eq!(spans[0].text, "Backpack");
        assert_eq!(spans[1].text, " for $59.99");
    }

    #[test]
    fn colors_become_paint_strings() {
        let mut config = Config::default();
        config.style.background_color = Color { hue: 200.0, saturation: 0.5, brightness: 0.5, alpha: 1.0 };
        let view = build_utc(&config, &event(), now());
        assert_eq!(view.container.background, "hsla(200, 50%, 50%, 1)");
        assert_eq!(view.container.color, "hsla(0, 0%, 0%, 1)");
        assert_eq!(view.time_ago.unwrap().color, "hsla(0, 0%, 0%, 0.5)");
    }

    #[test]
    fn shapes_control_radius() {
        let mut config = Config::default();
        config.display.popup_shape = Shape::Square;
        config.display.image_shape = Shape::Square;
        config.display.image_border = false;
        let view = build_utc(&config, &event(), now());
        assert_eq!(view.container.border_radius, "0");
        let image = view.image.unwrap();
        assert_eq!(image.border_radius, "0");
        assert!(image.border.is_none());
    }

    #[test]
    fn placement_follows_position() {
        let mut config = Config::default();
        config.display.position = Position::TopRight;
        let view = build_utc(&config, &event(), now());
        assert_eq!(view.placement.vertical, Vertical::Top);
        assert_eq!(view.placement.horizontal, Horizontal::Right);
    }

    #[test]
    fn time_ago_uses_configured_format() {
        let mut config = Config::default();
        config.text.time_ago_format = TimeFormat::Short;
        let view = build_utc(&config, &event(), now());
        assert_eq!(view.time_ago.unwrap().text, "3m");
    }

    #[test]
    fn html_contains_placement_and_escaped_text() {
        let mut e = event();
        e.customer = "<Emma>".into();
        let html = build_utc(&Config::default(), &e, now()).to_html();
        assert!(html.contains("bottom:20px;left:20px"));
        assert!(html.contains("&lt;Emma&gt; from Toronto"));
        assert!(html.contains("aria-label=\"Close notification\""));
        assert!(html.contains("$59.99"));
    }

    #[test]
    fn summary_joins_visible_parts() {
        let view = build_utc(&Config::default(), &event(), now());
        assert_eq!(view.summary(), "Emma from Toronto just purchased Backpack · $59.99 · 3 minutes ago");
    }
}
