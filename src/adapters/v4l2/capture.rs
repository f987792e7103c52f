use anyhow::{anyhow, Result};
use image::{ImageFormat, RgbImage};
use v4l::format::FourCC;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::Device;

use crate::domain::frame::{FacingMode, FrameSize, VideoConstraints};

/// Configuración para inicializar la captura de vídeo.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Dispositivo explícito; si falta se elige según `facing_mode`.
    pub camera_path: Option<String>,
    pub fourcc: String,
    pub constraints: VideoConstraints,
    pub fps: u32,
}

impl CaptureConfig {
    pub fn device_path(&self) -> String {
        match (&self.camera_path, self.constraints.facing_mode) {
            (Some(path), _) => path.clone(),
            (None, FacingMode::User) => "/dev/video0".into(),
            (None, FacingMode::Environment) => "/dev/video1".into(),
        }
    }
}

/// Adaptador para la captura física de frames usando V4L2.
pub struct V4l2Capture {
    stream: Stream<'static>,
    fourcc: FourCC,
    size: FrameSize,
}

impl V4l2Capture {
    /// Abre el dispositivo de cámara y configura el formato y el flujo de memoria mapeada (MMAP).
    pub fn open(cfg: &CaptureConfig) -> Result<Self> {
        let path = cfg.device_path();
        let dev = Device::with_path(&path)?;

        let mut fmt = dev.format()?;
        let b = cfg.fourcc.as_bytes();
        if b.len() != 4 {
            return Err(anyhow!("FourCC debe tener 4 caracteres"));
        }
        fmt.fourcc = FourCC::new(&[b[0], b[1], b[2], b[3]]);
        fmt.width = cfg.constraints.width;
        fmt.height = cfg.constraints.height;

        // El driver puede ajustar los valores a los más cercanos soportados
        let actual_fmt = dev.set_format(&fmt)?;

        let mut params = dev.params()?;
        params.interval.numerator = 1;
        params.interval.denominator = cfg.fps.max(1);
        let _ = dev.set_params(&params);

        // El dispositivo vive tanto como el stream 'static
        let dev_static: &'static Device = Box::leak(Box::new(dev));
        let stream = Stream::with_buffers(dev_static, v4l::buffer::Type::VideoCapture, 4)?;

        tracing::info!(
            "Cámara {} abierta: {}x{} [{}] a {} FPS",
            path, actual_fmt.width, actual_fmt.height, actual_fmt.fourcc, cfg.fps
        );

        Ok(Self {
            stream,
            fourcc: actual_fmt.fourcc,
            size: FrameSize::new(actual_fmt.width, actual_fmt.height),
        })
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Captura el siguiente frame en RGB (para inferencia) y JPEG (para la vista previa).
    pub fn next_rgb_and_jpeg(&mut self) -> Result<(RgbImage, Vec<u8>)> {
        let (data, _) = self.stream.next()?;
        let fcc_str = self.fourcc.str().map_err(|_| anyhow!("FourCC inválido"))?;
        let FrameSize { width, height } = self.size;

        match fcc_str {
            "MJPG" => {
                let img = image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;
                Ok((img.to_rgb8(), data.to_vec()))
            }
            "YUYV" => {
                let rgb = yuyv_to_rgb(data, width, height);
                let jpeg = super::snapshot::encode_jpeg(&rgb, 80)?;
                Ok((rgb, jpeg))
            }
            _ => Err(anyhow!("Formato de cámara {} no soportado", fcc_str)),
        }
    }
}

/// Convierte un buffer YUYV (YUV 4:2:2) a RGB con coeficientes BT.601.
pub(crate) fn yuyv_to_rgb(yuyv: &[u8], w: u32, h: u32) -> RgbImage {
    let mut out = RgbImage::new(w, h);

    // Cada bloque [Y0, U, Y1, V] define dos píxeles que comparten crominancia
    for (i, chunk) in yuyv.chunks_exact(4).enumerate() {
        let u = chunk[1] as f32 - 128.0;
        let v = chunk[3] as f32 - 128.0;

        let pixel_idx = i as u32 * 2;
        let x = pixel_idx % w;
        let y = pixel_idx / w;
        if y >= h {
            break;
        }

        out.put_pixel(x, y, yuv_pixel(chunk[0] as f32, u, v));
        if x + 1 < w {
            out.put_pixel(x + 1, y, yuv_pixel(chunk[2] as f32, u, v));
        }
    }
    out
}

fn yuv_pixel(y: f32, u: f32, v: f32) -> image::Rgb<u8> {
    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
    image::Rgb([r, g, b])
}
