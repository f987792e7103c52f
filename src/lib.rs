//! Detector de objetos por webcam con overlay en vivo y alerta por webhook
//! cuando aparece una persona.
//!
//! Arquitectura hexagonal: `domain` (tipos y reglas puras), `application`
//! (puertos, controlador y casos de uso) y `adapters` (V4L2, ONNX, HTTP).

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
