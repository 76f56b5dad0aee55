/// View composition: the report snapshot as a fixed-layout HTML page.
///
/// Layout, top to bottom:
/// 1. title, basin selector, export buttons
/// 2. GPM satellite rainfall, 7 day cards + weekly total
/// 3. SMAP soil moisture, 7 day cards + weekly mean
/// 4. reservoir grid | dam column | water-station river diagram
/// 5. 8-week rain forecast, 6-month SPEI outlook
///
/// The page is deterministic for a given snapshot apart from the generated
/// timestamp. All text coming from data is HTML-escaped.

use chrono::{Datelike, NaiveDate};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::model::{DailyValue, NO_DATA_SENTINEL, Reading};
use crate::palette::{StorageTier, TextTone, WaterLevelClass, day_accent, water_tag_text_tone};
use crate::report::ReportSnapshot;
use crate::targets::{BASINS, Side};

pub const REPORT_TITLE: &str = "สถานการณ์ฝน น้ำ และภัยแล้ง รายสัปดาห์";

/// Fixed desktop layout width; the export capture uses at least this.
pub const PAGE_MIN_WIDTH_PX: u32 = 1360;

/// Day cards per weekly row.
pub const DAYS_PER_WEEK: usize = 7;

const BUDDHIST_ERA_OFFSET: i32 = 543;

static THAI_MONTHS: [&str; 12] = [
    "มกราคม",
    "กุมภาพันธ์",
    "มีนาคม",
    "เมษายน",
    "พฤษภาคม",
    "มิถุนายน",
    "กรกฎาคม",
    "สิงหาคม",
    "กันยายน",
    "ตุลาคม",
    "พฤศจิกายน",
    "ธันวาคม",
];

// ---------------------------------------------------------------------------
// Thai date labels
// ---------------------------------------------------------------------------

/// `dd/mm/yy` with a two-digit Buddhist-era year: 2025-10-26 is `26/10/68`.
pub fn thai_short_date(date: NaiveDate) -> String {
    let be_year = (date.year() + BUDDHIST_ERA_OFFSET).rem_euclid(100);
    format!("{:02}/{:02}/{:02}", date.day(), date.month(), be_year)
}

/// Thai month name and Gregorian year for a `YYYY-MM` key, e.g.
/// `"2025-11"` is `("พฤศจิกายน", 2025)`.
pub fn thai_month_label(month_key: &str) -> Option<(&'static str, i32)> {
    let (year, month) = month_key.trim().split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: usize = month.parse().ok()?;
    let name = *THAI_MONTHS.get(month.checked_sub(1)?)?;
    Some((name, year))
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

struct Html {
    buf: String,
}

impl Html {
    fn new() -> Self {
        Html { buf: String::with_capacity(32 * 1024) }
    }

    fn push<S: AsRef<str>>(&mut self, s: S) {
        self.buf.push_str(s.as_ref());
    }

    fn text(&mut self, s: &str) {
        self.buf.push_str(&encode_text(s));
    }

    fn finish(self) -> String {
        self.buf
    }
}

fn attr(s: &str) -> String {
    encode_double_quoted_attribute(s).into_owned()
}

/// Icons are served by the HTTP surface under `/assets`.
fn asset_url(path: &str) -> String {
    format!("/assets{}", path)
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

pub fn render_html(snapshot: &ReportSnapshot) -> String {
    let mut w = Html::new();

    w.push("<!DOCTYPE html>\n<html lang=\"th\">\n<head>\n<meta charset=\"utf-8\">\n");
    w.push("<title>");
    w.text(REPORT_TITLE);
    w.push("</title>\n<style>\n");
    w.push(STYLE);
    w.push("</style>\n</head>\n<body>\n");

    write_toolbar(&mut w, snapshot);

    w.push(format!("<div id=\"report\" style=\"min-width:{}px\">\n", PAGE_MIN_WIDTH_PX));
    w.push("<h1>");
    w.text(REPORT_TITLE);
    w.push("</h1>\n");

    write_rainfall(&mut w, snapshot);
    write_soil_moisture(&mut w, snapshot);

    w.push("<div class=\"storage-row\">\n");
    write_reservoirs(&mut w, snapshot);
    write_dams(&mut w, snapshot);
    write_stations(&mut w, snapshot);
    w.push("</div>\n");

    write_forecast(&mut w, snapshot);
    write_drought(&mut w, snapshot);

    w.push(format!(
        "<p class=\"generated\">{}</p>\n",
        snapshot.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    w.push("</div>\n");
    w.push(SCRIPT);
    w.push("</body>\n</html>\n");
    w.finish()
}

fn write_toolbar(w: &mut Html, snapshot: &ReportSnapshot) {
    w.push("<nav class=\"toolbar\">\n<form method=\"get\" action=\"/\">\n<select name=\"basin\" onchange=\"this.form.submit()\">\n");
    for basin in BASINS {
        let selected = if basin.id == snapshot.basin.id { " selected" } else { "" };
        w.push(format!("<option value=\"{}\"{}>", attr(basin.id), selected));
        w.text(basin.name);
        w.push("</option>\n");
    }
    w.push("</select>\n</form>\n");
    for (format, label) in [("png", "PNG"), ("jpg", "JPG"), ("pdf", "PDF")] {
        w.push(format!(
            "<button type=\"button\" class=\"export\" data-format=\"{}\">{}</button>\n",
            format, label
        ));
    }
    w.push("</nav>\n");
}

// ---------------------------------------------------------------------------
// Daily rows
// ---------------------------------------------------------------------------

/// Seven cards; missing days render as `-` cells.
fn write_day_cards(w: &mut Html, days: &[DailyValue], unit: &str, value: fn(f64) -> String) {
    w.push("<div class=\"day-cards\">\n");
    for i in 0..DAYS_PER_WEEK {
        let (date, val) = match days.get(i) {
            Some(day) => (thai_short_date(day.date), value(day.value)),
            None => (NO_DATA_SENTINEL.to_string(), NO_DATA_SENTINEL.to_string()),
        };
        w.push(format!(
            "<div class=\"day-card\" style=\"border-color:{}\"><span class=\"date\" style=\"background:{}\">{}</span><span class=\"value\">{}</span><span class=\"unit\">",
            day_accent(i),
            day_accent(i),
            date,
            val
        ));
        w.text(unit);
        w.push("</span></div>\n");
    }
    w.push("</div>\n");
}

fn write_rainfall(w: &mut Html, snapshot: &ReportSnapshot) {
    w.push("<section class=\"rainfall\">\n<h2>ปริมาณฝนจากดาวเทียม GPM</h2>\n");
    let days = snapshot.rainfall.as_ref().map_or(&[][..], |r| &r.days[..]);
    write_day_cards(w, days, "- มิลลิเมตร -", |v| format!("{:.1}", v));

    let total = snapshot
        .rainfall
        .as_ref()
        .map_or(NO_DATA_SENTINEL.to_string(), |r| format!("{:.1}", r.total));
    w.push(format!(
        "<div class=\"summary\"><p>สะสม ทั้งสัปดาห์</p><span class=\"total\">{}</span><span>- มิลลิเมตร -</span></div>\n",
        total
    ));
    w.push("</section>\n");
}

fn write_soil_moisture(w: &mut Html, snapshot: &ReportSnapshot) {
    w.push("<section class=\"soil\">\n<h2>ความชื้นผิวดินจากดาวเทียม SMAP</h2>\n");
    let days = snapshot.soil_moisture.as_ref().map_or(&[][..], |s| &s.days[..]);
    write_day_cards(w, days, "- m³/m³ -", |v| format!("{:.2}", v));

    let mean = snapshot
        .soil_moisture
        .as_ref()
        .and_then(|s| s.mean)
        .map_or(NO_DATA_SENTINEL.to_string(), |m| format!("{:.2}", m));
    w.push(format!(
        "<div class=\"summary\"><p>เฉลี่ย ทั้งสัปดาห์</p><span class=\"mean\">{}</span><span>m³/m³</span></div>\n",
        mean
    ));
    w.push("</section>\n");
}

// ---------------------------------------------------------------------------
// Storage and levels
// ---------------------------------------------------------------------------

fn percent(val: Reading) -> String {
    match val {
        Reading::Measured(v) => format!("{}%", v),
        Reading::NoData => NO_DATA_SENTINEL.to_string(),
    }
}

fn write_reservoirs(w: &mut Html, snapshot: &ReportSnapshot) {
    w.push("<section class=\"reservoirs\">\n<h2>ปริมาณน้ำกักเก็บ <span>อ่างเก็บน้ำ</span></h2>\n<p class=\"caption\">- ปริมาณน้ำ (%) ณ ปัจจุบัน -</p>\n<div class=\"reservoir-grid\">\n");
    for entry in &snapshot.reservoirs {
        let tier = StorageTier::classify(entry.val);
        w.push(format!(
            "<div class=\"reservoir\"><img src=\"{}\" alt=\"\"><span class=\"name\">",
            attr(&asset_url(tier.reservoir_image()))
        ));
        w.text(&entry.name);
        w.push(format!("</span><span class=\"value\">{}</span></div>\n", percent(entry.val)));
    }
    w.push("</div>\n</section>\n");
}

fn write_dams(w: &mut Html, snapshot: &ReportSnapshot) {
    w.push("<section class=\"dams\">\n<h2>ปริมาณน้ำกักเก็บ <span>เขื่อน</span></h2>\n<p class=\"caption\">- ปริมาณน้ำ (%) ณ ปัจจุบัน -</p>\n");
    for entry in &snapshot.dams {
        let tier = StorageTier::classify(entry.val);
        w.push(format!(
            "<div class=\"dam\" style=\"background:{}\"><span class=\"name\">",
            tier.dam_color()
        ));
        w.text(&entry.name);
        w.push(format!("</span><span class=\"value\">{}</span>", percent(entry.val)));
        w.push(format!(
            "<span class=\"pill\" style=\"background:{};color:{}\">",
            tier.dam_color(),
            TextTone::White.css()
        ));
        w.text(&entry.text_level);
        w.push("</span></div>\n");
    }
    w.push("</section>\n");
}

fn write_stations(w: &mut Html, snapshot: &ReportSnapshot) {
    w.push("<section class=\"stations\">\n<h2>ระดับน้ำ <span>ณ สถานีวัดน้ำ</span></h2>\n<p class=\"caption\">- ระดับน้ำ (ม.รทก.) ณ ปัจจุบัน -</p>\n<div class=\"river\">\n");
    for entry in &snapshot.stations {
        let slot = entry.slot;
        let class = WaterLevelClass::classify(&entry.text_level);
        let tone = water_tag_text_tone(&entry.text_level);
        let (edge, mirror) = match slot.side {
            Side::Left => ("left", " mirrored"),
            Side::Right => ("right", ""),
        };
        w.push(format!(
            "<div class=\"tag{}\" style=\"top:{}%;{}:{}%;width:{}px;height:{}px;background-image:url('{}');color:{}\">",
            mirror,
            slot.top_pct,
            edge,
            slot.edge_pct,
            slot.width_px,
            slot.height_px,
            attr(&asset_url(class.tag_image())),
            tone.css()
        ));
        match slot.name_font_px {
            Some(px) => w.push(format!("<span class=\"name\" style=\"font-size:{}px\">", px)),
            None => w.push("<span class=\"name\">"),
        }
        for (i, line) in slot.label().lines().enumerate() {
            if i > 0 {
                w.push("<br>");
            }
            w.text(line);
        }
        w.push("</span><span class=\"value\">");
        match entry.val {
            Reading::Measured(v) => w.push(format!("{} ม. รทก.", v)),
            Reading::NoData => w.push(NO_DATA_SENTINEL),
        }
        w.push("</span><span class=\"level\">");
        w.text(&entry.text_level);
        w.push("</span></div>\n");
    }
    w.push("</div>\n</section>\n");
}

// ---------------------------------------------------------------------------
// Outlook rows
// ---------------------------------------------------------------------------

fn write_forecast(w: &mut Html, snapshot: &ReportSnapshot) {
    w.push("<section class=\"forecast\">\n<h3>พยากรณ์ ฝน รายสัปดาห์ ล่วงหน้า 2 เดือน (8 สัปดาห์)</h3>\n<div class=\"weeks\">\n");
    let weeks = snapshot.rain_forecast.as_ref().map_or(&[][..], |f| &f.weeks[..]);
    if weeks.is_empty() {
        w.push("<div class=\"week\"><span class=\"value\">-</span></div>\n");
    }
    for week in weeks {
        w.push(format!(
            "<div class=\"week\"><span class=\"value\">{:.1}</span><span class=\"unit\">- มม. -</span><span class=\"date\">{}</span></div>\n",
            week.value,
            thai_short_date(week.date)
        ));
    }
    w.push("</div>\n</section>\n");
}

fn write_drought(w: &mut Html, snapshot: &ReportSnapshot) {
    w.push("<section class=\"drought\">\n<h3>พยากรณ์ ดัชนีภัยแล้ง SPEI รายเดือน ล่วงหน้า 6 เดือน</h3>\n<div class=\"months\">\n");
    let months = snapshot.drought.as_ref().map_or(&[][..], |d| &d.months[..]);
    if months.is_empty() {
        w.push("<div class=\"month\"><span class=\"value\">-</span></div>\n");
    }
    for month in months {
        w.push(format!("<div class=\"month\"><span class=\"value\">{:.1}</span>", month.value));
        match thai_month_label(&month.month) {
            Some((name, year)) => w.push(format!("<span class=\"name\">{}</span><span class=\"year\">{}</span>", name, year)),
            None => {
                w.push("<span class=\"name\">");
                w.text(&month.month);
                w.push("</span>");
            }
        }
        w.push("</div>\n");
    }
    w.push("</div>\n</section>\n");
}

const STYLE: &str = r#"body { margin: 0; font-family: "Prompt", sans-serif; background: #2d5f8b; }
#report { padding: 32px; }
h1 { text-align: center; color: #fff; }
h2, h3 { color: #fff; }
.toolbar { position: fixed; top: 12px; right: 12px; display: flex; gap: 8px; z-index: 50; }
.day-cards, .weeks, .months { display: flex; gap: 12px; }
.day-card { display: flex; flex-direction: column; align-items: center; background: #fff; border: 3px solid; border-radius: 12px; width: 120px; }
.day-card .date { width: 100%; text-align: center; color: #fff; border-radius: 8px 8px 0 0; }
.day-card .value { font-size: 28px; font-weight: 900; font-family: monospace; }
.day-card .unit { font-size: 10px; color: #545454; }
.storage-row { display: grid; grid-template-columns: 1fr 0.8fr 1.2fr; }
.reservoir-grid { display: grid; grid-template-columns: 1fr 1fr; gap: 8px; }
.reservoir img { width: 48px; }
.dam { border-radius: 12px; padding: 12px; margin-bottom: 12px; }
.pill { border-radius: 999px; padding: 2px 10px; }
.river { position: relative; height: 900px; }
.tag { position: absolute; background-size: 100% 100%; display: flex; flex-direction: column; align-items: center; justify-content: center; font-size: 11px; }
.tag.mirrored { transform: scaleX(-1); }
.tag.mirrored > span { transform: scaleX(-1); }
.generated { color: #fff; font-size: 10px; }
"#;

/// Export buttons download from `/export/{format}` under the name the server
/// sends in `Content-Disposition`; failures come back as a JSON body with
/// the alert text.
const SCRIPT: &str = r#"<script>
document.querySelectorAll("button.export").forEach(function (button) {
  button.addEventListener("click", async function () {
    const format = button.dataset.format;
    try {
      const response = await fetch("/export/" + format);
      if (!response.ok) {
        const body = await response.json();
        alert(body.alert);
        return;
      }
      const blob = await response.blob();
      const link = document.createElement("a");
      link.href = URL.createObjectURL(blob);
      const disposition = response.headers.get("Content-Disposition") || "";
      const name = /filename\*=UTF-8''([^;]+)/.exec(disposition);
      link.download = name ? decodeURIComponent(name[1]) : "";
      link.click();
      URL.revokeObjectURL(link.href);
    } catch (err) {
      alert("เกิดข้อผิดพลาดในการดาวน์โหลด: " + err.message);
    }
  });
});
</script>
"#;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::reconcile::{reconcile_dams, reconcile_reservoirs, reconcile_stations};
    use crate::analysis::series::{DroughtOutlook, RainfallSummary, SoilMoistureSummary};
    use crate::model::{DamRecord, MonthlyValue, ReservoirRecord, WaterStationRecord};
    use crate::targets::{TARGET_DAMS, TARGET_RESERVOIRS, TARGET_WATER_STATIONS, find_basin};
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn empty_snapshot() -> ReportSnapshot {
        ReportSnapshot {
            basin: find_basin("ping").unwrap(),
            generated_at: Utc::now(),
            reservoirs: reconcile_reservoirs(TARGET_RESERVOIRS, &[]),
            dams: reconcile_dams(TARGET_DAMS, &[]),
            stations: reconcile_stations(TARGET_WATER_STATIONS, &[]),
            rainfall: None,
            soil_moisture: None,
            rain_forecast: None,
            drought: None,
        }
    }

    #[test]
    fn test_thai_short_date_uses_buddhist_era() {
        assert_eq!(thai_short_date(date(2025, 10, 26)), "26/10/68");
        assert_eq!(thai_short_date(date(2026, 1, 2)), "02/01/69");
    }

    #[test]
    fn test_thai_month_label() {
        assert_eq!(thai_month_label("2025-11"), Some(("พฤศจิกายน", 2025)));
        assert_eq!(thai_month_label("2026-01"), Some(("มกราคม", 2026)));
        assert_eq!(thai_month_label("2026-13"), None);
        assert_eq!(thai_month_label("2026-00"), None);
        assert_eq!(thai_month_label("April"), None);
    }

    #[test]
    fn test_empty_snapshot_renders_placeholders() {
        let html = render_html(&empty_snapshot());
        assert!(html.contains(REPORT_TITLE));
        assert_eq!(html.matches("class=\"day-card\"").count(), 2 * DAYS_PER_WEEK);
        assert_eq!(html.matches("class=\"reservoir\"").count(), TARGET_RESERVOIRS.len());
        assert_eq!(html.matches("class=\"dam\"").count(), TARGET_DAMS.len());
        assert_eq!(html.matches("class=\"tag").count(), TARGET_WATER_STATIONS.len());
        assert!(html.contains("/assets/ResNodata.png"));
        assert!(html.contains("/assets/tag_gray.png"));
        assert!(html.contains("ไม่มีข้อมูล"));
    }

    #[test]
    fn test_day_cards_and_summaries_format() {
        let mut snapshot = empty_snapshot();
        let days = vec![
            DailyValue { date: date(2025, 10, 26), value: 20.0 },
            DailyValue { date: date(2025, 10, 27), value: 0.28 },
        ];
        snapshot.rainfall = Some(RainfallSummary { days: days.clone(), total: 148.0 });
        snapshot.soil_moisture = Some(SoilMoistureSummary { days, mean: Some(0.3) });

        let html = render_html(&snapshot);
        assert!(html.contains(">20.0<"));
        assert!(html.contains(">0.28<"));
        assert!(html.contains(">26/10/68<"));
        assert!(html.contains("<span class=\"total\">148.0</span>"));
        assert!(html.contains("<span class=\"mean\">0.30</span>"));
    }

    #[test]
    fn test_station_and_storage_tokens() {
        let mut snapshot = empty_snapshot();
        snapshot.reservoirs = reconcile_reservoirs(
            TARGET_RESERVOIRS,
            &[ReservoirRecord { name: TARGET_RESERVOIRS[0].to_string(), val: Reading::Measured(8.0) }],
        );
        snapshot.dams = reconcile_dams(
            TARGET_DAMS,
            &[DamRecord { name: "เขื่อนแม่กวงอุดมธารา".to_string(), val: Reading::Measured(71.6), text_level: "น้ำมาก".to_string() }],
        );
        snapshot.stations = reconcile_stations(
            TARGET_WATER_STATIONS,
            &[WaterStationRecord { name: "สถานีฮอด".to_string(), val: Reading::Measured(-2.15), text_level: "น้ำล้นตลิ่ง".to_string() }],
        );

        let html = render_html(&snapshot);
        assert!(html.contains("/assets/ResYellow.png"));
        assert!(html.contains("background:#d65c59"));
        assert!(html.contains("-2.15 ม. รทก."));
        assert!(html.contains("/assets/tag_darkred.png"));
        assert!(html.contains("color:#ffffff"));
    }

    #[test]
    fn test_dam_pill_text_is_always_white() {
        let mut snapshot = empty_snapshot();
        snapshot.dams = reconcile_dams(
            TARGET_DAMS,
            &[DamRecord { name: TARGET_DAMS[0].to_string(), val: Reading::Measured(50.0), text_level: "น้ำปกติ".to_string() }],
        );
        let html = render_html(&snapshot);
        assert!(html.contains("<span class=\"pill\" style=\"background:#6c9cde;color:#ffffff\">น้ำปกติ</span>"));
        // The unmatched dam keeps white text on gray too.
        assert!(html.contains("<span class=\"pill\" style=\"background:#b4b4b4;color:#ffffff\">ไม่มีข้อมูล</span>"));
    }

    #[test]
    fn test_export_script_names_file_from_server() {
        let html = render_html(&empty_snapshot());
        assert!(html.contains("response.headers.get(\"Content-Disposition\")"));
        assert!(!html.contains("\"water-report.\" + format"));
    }

    #[test]
    fn test_left_tags_are_mirrored() {
        let html = render_html(&empty_snapshot());
        let mirrored = html.matches("class=\"tag mirrored\"").count();
        let left = TARGET_WATER_STATIONS.iter().filter(|s| s.side == Side::Left).count();
        assert_eq!(mirrored, left);
    }

    #[test]
    fn test_multiline_labels_break() {
        let html = render_html(&empty_snapshot());
        assert!(html.contains("สถานีสะพานนวรัฐ<br>*สถานีเตือนภัย"));
    }

    #[test]
    fn test_drought_months_use_thai_names() {
        let mut snapshot = empty_snapshot();
        snapshot.drought = Some(DroughtOutlook {
            months: vec![
                MonthlyValue { month: "2025-11".to_string(), value: -0.3 },
                MonthlyValue { month: "bogus".to_string(), value: -0.5 },
            ],
        });
        let html = render_html(&snapshot);
        assert!(html.contains("<span class=\"name\">พฤศจิกายน</span><span class=\"year\">2025</span>"));
        assert!(html.contains(">-0.3<"));
        assert!(html.contains("<span class=\"name\">bogus</span>"));
    }

    #[test]
    fn test_data_text_is_escaped() {
        let mut snapshot = empty_snapshot();
        snapshot.dams = reconcile_dams(
            &["<b>"],
            &[DamRecord { name: "<b>Dam</b>".to_string(), val: Reading::NoData, text_level: "a & b".to_string() }],
        );
        let html = render_html(&snapshot);
        assert!(html.contains("&lt;b&gt;Dam&lt;/b&gt;"));
        assert!(html.contains("a &amp; b"));
        assert!(!html.contains("<b>Dam"));
    }

    #[test]
    fn test_current_basin_is_selected() {
        let html = render_html(&empty_snapshot());
        assert!(html.contains("<option value=\"ping\" selected>"));
        assert!(html.contains("<option value=\"mae_taeng\">"));
    }
}
