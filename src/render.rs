use crate::error::{Error, Result};
use crate::{min_and_max, suitable_xfmt, AggregatedSeries, COL_DATE, COL_VIEWS};
use chrono::prelude::*;
use log::{debug, info};
use minifb::{Key, Window, WindowOptions};
use plotters::coord::Shift;
use plotters::prelude::*;

pub const CHART_SIZE: (u32, u32) = (1200, 700);

/// axes background and grid, a light grey-blue with white lines
const BACKGROUND: RGBColor = RGBColor(234, 234, 242);

/// categorical colors, one per channel, cycled
const PALETTE: [(u8, u8, u8); 10] = [
    (76, 114, 176),
    (221, 132, 82),
    (85, 168, 104),
    (196, 78, 82),
    (129, 114, 179),
    (147, 120, 96),
    (218, 139, 195),
    (140, 140, 140),
    (204, 185, 116),
    (100, 181, 205),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Cross,
    Square,
    Triangle,
}

const MARKERS: [Marker; 4] = [Marker::Circle, Marker::Cross, Marker::Square, Marker::Triangle];

/// Color and marker of one line; both follow the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStyle {
    pub color: (u8, u8, u8),
    pub marker: Marker,
}

impl LineStyle {
    /// style of the n-th channel
    pub fn nth(n: usize) -> LineStyle {
        LineStyle {
            color: PALETTE[n % PALETTE.len()],
            marker: MARKERS[n % MARKERS.len()],
        }
    }

    fn rgb(&self) -> RGBColor {
        RGBColor(self.color.0, self.color.1, self.color.2)
    }
}

/// One line of the chart: the points of a single channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotLine {
    /// `None` for the single unlabeled line of a series without channels
    pub label: Option<String>,
    pub style: LineStyle,
    pub points: Vec<(NaiveDate, u64)>,
}

/// Splits the series into one line per channel, in channel order.
pub fn plan_lines(series: &AggregatedSeries) -> Vec<PlotLine> {
    series
        .channels()
        .into_iter()
        .enumerate()
        .map(|(i, channel)| {
            let points: Vec<(NaiveDate, u64)> = series
                .channel_rows(&channel)
                .map(|r| (r.date, r.views))
                .collect();
            PlotLine {
                label: channel,
                style: LineStyle::nth(i),
                points,
            }
        })
        .collect()
}

/// A drawn chart kept in memory as RGB pixels until it is shown.
pub struct ChartHandle {
    width: usize,
    height: usize,
    buffer: Vec<u8>,
    lines: Vec<PlotLine>,
}

impl ChartHandle {
    pub fn lines(&self) -> &[PlotLine] {
        &self.lines[..]
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// pixels packed as 0RGB, the layout the window expects
    pub fn to_0rgb(&self) -> Vec<u32> {
        self.buffer
            .chunks(3)
            .map(|p| (p[0] as u32) << 16 | (p[1] as u32) << 8 | p[2] as u32)
            .collect()
    }

    /// Opens a window with the chart and blocks until it is closed
    /// (or Escape is pressed).
    pub fn show(self) -> Result<()> {
        let pixels = self.to_0rgb();
        let mut window = Window::new(
            "YouTube analytics",
            self.width,
            self.height,
            WindowOptions::default(),
        )
        .map_err(|e| Error::Display(e.to_string()))?;
        window.set_target_fps(30);
        info!("showing chart, close the window to exit");
        while window.is_open() && !window.is_key_down(Key::Escape) {
            window
                .update_with_buffer(&pixels, self.width, self.height)
                .map_err(|e| Error::Display(e.to_string()))?;
        }
        debug!("chart window closed");
        Ok(())
    }
}

fn render_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Render(e.to_string())
}

fn to_utc(d: NaiveDate) -> DateTime<Utc> {
    TimeZone::from_utc_datetime(&Utc, &d.and_time(NaiveTime::MIN))
}

/// Draws the line chart of the series into an in-memory bitmap.
pub fn render(series: &AggregatedSeries) -> Result<ChartHandle> {
    let lines = plan_lines(series);
    if lines.iter().all(|l| l.points.is_empty()) {
        return Err(Error::EmptySeries);
    }
    let (w, h) = CHART_SIZE;
    let mut buffer = vec![0u8; (w * h * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
        draw_chart(&root, &lines)?;
        root.present().map_err(render_err)?;
    }
    info!("drew {} line(s)", lines.len());
    Ok(ChartHandle {
        width: w as usize,
        height: h as usize,
        buffer,
        lines,
    })
}

/// Draws the lines on any backend: date on x, views on y,
/// a marker on every point and a legend for labeled lines.
pub fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    lines: &[PlotLine],
) -> Result<()> {
    let dates: Vec<NaiveDate> = lines
        .iter()
        .flat_map(|l| l.points.iter().map(|p| p.0))
        .collect();
    let views: Vec<f64> = lines
        .iter()
        .flat_map(|l| l.points.iter().map(|p| p.1 as f64))
        .collect();
    let (xmin, xmax) = min_and_max(&dates[..]).ok_or(Error::EmptySeries)?;
    let (ymin, ymax) = min_and_max(&views[..]).ok_or(Error::EmptySeries)?;

    let xspan: chrono::Duration = xmax - xmin;
    let xmargin = if xspan == chrono::Duration::zero() {
        chrono::Duration::days(1)
    } else {
        xspan / 20
    };
    let xfmt = suitable_xfmt(xspan);
    let xminutc = to_utc(xmin) - xmargin;
    let xmaxutc = to_utc(xmax) + xmargin;
    let ymargin = if ymax > ymin { (ymax - ymin) / 10f64 } else { 1f64 };
    let ymin = (ymin - ymargin).max(0f64);
    let ymax = ymax + ymargin;

    root.fill(&WHITE).map_err(render_err)?;
    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(xminutc..xmaxutc, ymin..ymax)
        .map_err(render_err)?;
    chart.plotting_area().fill(&BACKGROUND).map_err(render_err)?;
    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(WHITE.stroke_width(1))
        .set_all_tick_mark_size(2)
        .label_style(("sans-serif", 16))
        .x_labels(12)
        .x_label_formatter(&|x: &DateTime<Utc>| x.format(xfmt).to_string())
        .y_label_formatter(&|y: &f64| format!("{:.0}", y))
        .x_desc(COL_DATE)
        .y_desc(COL_VIEWS)
        .draw()
        .map_err(render_err)?;

    for line in lines.iter() {
        let color = line.style.rgb();
        let points: Vec<(DateTime<Utc>, f64)> = line
            .points
            .iter()
            .map(|(d, v)| (to_utc(*d), *v as f64))
            .collect();
        let anno = chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
            .map_err(render_err)?;
        if let Some(label) = &line.label {
            anno.label(label.as_str()).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
        }
        match line.style.marker {
            Marker::Circle => chart
                .draw_series(points.iter().map(|p| Circle::new(*p, 4, color.filled())))
                .map_err(render_err)?,
            Marker::Cross => chart
                .draw_series(points.iter().map(|p| Cross::new(*p, 4, color.stroke_width(2))))
                .map_err(render_err)?,
            Marker::Square => chart
                .draw_series(points.iter().map(|p| {
                    EmptyElement::at(*p) + Rectangle::new([(-4, -4), (4, 4)], color.filled())
                }))
                .map_err(render_err)?,
            Marker::Triangle => chart
                .draw_series(
                    points
                        .iter()
                        .map(|p| TriangleMarker::new(*p, 5, color.filled())),
                )
                .map_err(render_err)?,
        };
    }

    if lines.iter().any(|l| l.label.is_some()) {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .label_font(("sans-serif", 16))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_err)?;
    }
    Ok(())
}
