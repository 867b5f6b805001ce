//! Python 綁定模組 (PyO3)

use pyo3::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DetectorConfig;
use crate::detector::ViralMomentDetector;
use crate::exporter::{Exporter, MarkerFormat};
use crate::lexicon::Lexicon;
use crate::report::generate_report;
use crate::types::{CandidateMoment, TranscriptFragment};

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string())
}

fn io_error(e: impl std::fmt::Display) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyIOError, _>(e.to_string())
}

/// Python 逐字稿片段
#[pyclass(name = "TranscriptFragment")]
#[derive(Clone)]
pub struct PyTranscriptFragment {
    inner: TranscriptFragment,
}

#[pymethods]
impl PyTranscriptFragment {
    #[new]
    fn new(text: &str, start_time: f64, end_time: f64) -> Self {
        Self {
            inner: TranscriptFragment::new(text, start_time, end_time),
        }
    }

    #[getter]
    fn text(&self) -> String {
        self.inner.text.clone()
    }

    #[getter]
    fn start_time(&self) -> f64 {
        self.inner.start_time
    }

    #[getter]
    fn end_time(&self) -> f64 {
        self.inner.end_time
    }
}

/// Python 精彩片段
#[pyclass(name = "CandidateMoment")]
#[derive(Clone)]
pub struct PyCandidateMoment {
    inner: CandidateMoment,
}

#[pymethods]
impl PyCandidateMoment {
    #[getter]
    fn start_time(&self) -> f64 {
        self.inner.start_time
    }

    #[getter]
    fn end_time(&self) -> f64 {
        self.inner.end_time
    }

    #[getter]
    fn duration(&self) -> f64 {
        self.inner.duration()
    }

    #[getter]
    fn score(&self) -> f64 {
        self.inner.score
    }

    #[getter]
    fn reasons(&self) -> Vec<String> {
        self.inner.reasons.clone()
    }

    #[getter]
    fn category_breakdown(&self) -> HashMap<String, f64> {
        self.inner
            .category_breakdown
            .iter()
            .map(|(category, value)| (category.to_string(), *value))
            .collect()
    }

    #[getter]
    fn text(&self) -> String {
        self.inner.text.clone()
    }
}

/// Python 偵測器
#[pyclass(name = "ViralMomentDetector")]
pub struct PyViralMomentDetector {
    inner: ViralMomentDetector,
}

#[pymethods]
impl PyViralMomentDetector {
    #[new]
    #[pyo3(signature = (min_score=0.3, max_results=10, max_clip_length=60.0, min_clip_length=3.0, max_gap=3.0, lexicon_path=None))]
    fn new(
        min_score: f64,
        max_results: usize,
        max_clip_length: f64,
        min_clip_length: f64,
        max_gap: f64,
        lexicon_path: Option<&str>,
    ) -> PyResult<Self> {
        let lexicon = match lexicon_path {
            Some(path) => Lexicon::from_file(path).map_err(value_error)?,
            None => Lexicon::default(),
        };

        let config = DetectorConfig {
            min_score,
            max_results,
            max_clip_length,
            min_clip_length,
            max_gap,
            ..Default::default()
        };

        let inner = ViralMomentDetector::new(Arc::new(lexicon), config).map_err(value_error)?;
        Ok(Self { inner })
    }

    /// 偵測精彩片段
    fn detect(&self, transcript: Vec<PyTranscriptFragment>) -> PyResult<Vec<PyCandidateMoment>> {
        let fragments: Vec<TranscriptFragment> = transcript.into_iter().map(|f| f.inner).collect();

        let moments = self.inner.detect(&fragments).map_err(value_error)?;
        Ok(moments
            .into_iter()
            .map(|inner| PyCandidateMoment { inner })
            .collect())
    }
}

fn unwrap_moments(moments: Vec<PyCandidateMoment>) -> Vec<CandidateMoment> {
    moments.into_iter().map(|m| m.inner).collect()
}

/// 產生文字報告
#[pyfunction]
fn report(moments: Vec<PyCandidateMoment>) -> String {
    generate_report(&unwrap_moments(moments))
}

/// 匯出 JSON 報告
#[pyfunction]
#[pyo3(signature = (moments, source, output_path, pretty=true))]
fn to_json(moments: Vec<PyCandidateMoment>, source: &str, output_path: &str, pretty: bool) -> PyResult<()> {
    Exporter::to_json(&unwrap_moments(moments), source, output_path, pretty).map_err(io_error)
}

/// 匯出標記檔案
#[pyfunction]
#[pyo3(signature = (moments, output_path, format="csv"))]
fn to_markers(moments: Vec<PyCandidateMoment>, output_path: &str, format: &str) -> PyResult<()> {
    let format: MarkerFormat = format.parse().map_err(value_error)?;
    Exporter::to_markers(&unwrap_moments(moments), output_path, format).map_err(io_error)
}

/// Python 模組初始化
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTranscriptFragment>()?;
    m.add_class::<PyCandidateMoment>()?;
    m.add_class::<PyViralMomentDetector>()?;
    m.add_function(wrap_pyfunction!(report, m)?)?;
    m.add_function(wrap_pyfunction!(to_json, m)?)?;
    m.add_function(wrap_pyfunction!(to_markers, m)?)?;
    Ok(())
}
