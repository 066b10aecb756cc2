use crate::error::BenchPlotError;
use crate::utils::{padded_range, sanitize_file_stem, split_at_nan};
use crate::{Measurement, MeasurementTable};
use log::{info, warn};
use plotters::prelude::*;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

/// How and where the charts are produced.
#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub outdir: PathBuf,
    /// Sort each series by run before drawing, otherwise keep the source order.
    pub sort_runs: bool,
}

/// One library's line: (run, milliseconds) points.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub library: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub y_desc: &'static str,
    pub series: Vec<Series>,
}

/// The read and write charts of one benchmarked file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileCharts {
    pub file: String,
    pub read: Chart,
    pub write: Chart,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlotOutcome {
    /// No row for the file, nothing drawn.
    Skipped,
    Rendered {
        read: PathBuf,
        write: PathBuf,
        libraries: usize,
    },
}

impl FileCharts {
    /// Group the rows of the file by library, one series per library in each chart.
    /// None if no row belongs to the file.
    pub fn build(table: &MeasurementTable, file: &str, sort_runs: bool) -> Option<FileCharts> {
        let subset = table.for_file(file);
        if subset.is_empty() {
            return None;
        }
        let mut read_series = Vec::new();
        let mut write_series = Vec::new();
        for library in subset.libraries() {
            let mut rows: Vec<&Measurement> = subset.for_library(library).collect();
            if sort_runs {
                rows.sort_by_key(|m| m.run);
            }
            read_series.push(Series {
                library: library.to_owned(),
                points: rows.iter().map(|m| (m.run as f64, m.read_ms)).collect(),
            });
            write_series.push(Series {
                library: library.to_owned(),
                points: rows.iter().map(|m| (m.run as f64, m.write_ms)).collect(),
            });
        }
        Some(FileCharts {
            file: file.to_owned(),
            read: Chart {
                title: format!("Read time for {}", file),
                y_desc: "Read (ms)",
                series: read_series,
            },
            write: Chart {
                title: format!("Write time for {}", file),
                y_desc: "Write (ms)",
                series: write_series,
            },
        })
    }

    /// Write the two charts as svg files in the output directory,
    /// named `<stem>_read.svg` and `<stem>_write.svg`.
    pub fn render(&self, outdir: &Path, stem: &str) -> Result<PlotOutcome, BenchPlotError> {
        fs::create_dir_all(outdir).map_err(|source| BenchPlotError::CreateDir {
            path: outdir.to_path_buf(),
            source,
        })?;
        let read = outdir.join(format!("{}_read.svg", stem));
        let write = outdir.join(format!("{}_write.svg", stem));
        for (chart, fout) in [(&self.read, &read), (&self.write, &write)] {
            chart
                .plot_svg(fout)
                .map_err(|source| BenchPlotError::Render {
                    path: fout.clone(),
                    source,
                })?;
            info!("saved {:?}", fout);
        }
        Ok(PlotOutcome::Rendered {
            read,
            write,
            libraries: self.read.series.len(),
        })
    }
}

impl Chart {
    /// Plot the series as lines with markers, with legend and grid, to svg.
    /// NAN points are not drawn and break the line.
    pub fn plot_svg<P>(&self, fout: P) -> Result<(), Box<dyn Error + Send + Sync>>
    where
        P: AsRef<Path>,
    {
        let xrange = padded_range(self.series.iter().flat_map(|s| s.points.iter().map(|p| &p.0)));
        let yrange = padded_range(self.series.iter().flat_map(|s| s.points.iter().map(|p| &p.1)));
        let root = SVGBackend::new(&fout, (1200, 800)).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", 30))
            .margin(30)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(xrange, yrange)?;
        chart
            .configure_mesh()
            .bold_line_style(RGBColor(100, 100, 100).mix(0.5).stroke_width(1))
            .light_line_style(RGBColor(200, 200, 200).mix(0.3))
            .label_style(("sans-serif", 18))
            .x_desc("Run")
            .y_desc(self.y_desc)
            .x_label_formatter(&|x| format!("{:.0}", x))
            .draw()?;
        for (idx, series) in self.series.iter().enumerate() {
            let color = Palette99::pick(idx).mix(0.9);
            let segments = split_at_nan(&series.points);
            chart
                .draw_series(
                    segments
                        .into_iter()
                        .map(|s| PathElement::new(s, color.stroke_width(2))),
                )?
                .label(series.library.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            chart.draw_series(
                series
                    .points
                    .iter()
                    .filter(|(_, y)| y.is_finite())
                    .map(|&p| Circle::new(p, 4, color.filled())),
            )?;
        }
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", 18))
            .draw()?;
        root.present()?;
        Ok(())
    }
}

/// Plot the read and write charts of one file.
/// A file without rows is skipped with a warning, it is not an error.
pub fn plot_file_results(
    table: &MeasurementTable,
    file: &str,
    options: &PlotOptions,
) -> Result<PlotOutcome, BenchPlotError> {
    return plot_file_results_as(table, file, &sanitize_file_stem(file), options);
}

/// As `plot_file_results`, with the file name stem chosen by the caller.
pub fn plot_file_results_as(
    table: &MeasurementTable,
    file: &str,
    stem: &str,
    options: &PlotOptions,
) -> Result<PlotOutcome, BenchPlotError> {
    let charts = match FileCharts::build(table, file, options.sort_runs) {
        Some(charts) => charts,
        None => {
            warn!("No data for file {}", file);
            return Ok(PlotOutcome::Skipped);
        }
    };
    charts.render(&options.outdir, stem)
}
