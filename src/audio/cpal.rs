// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info, span, warn, Level};

use crate::audio::mixer::{AudioMixer, SourceReceiver};
use crate::audio::{Clip, Device as AudioDevice};
use crate::config;
use crate::samples::ClipEngine;

/// The device name that selects the host's default output.
const DEFAULT_DEVICE: &str = "default";

/// Drum clips are mixed to at most stereo.
const MAX_OUTPUT_CHANNELS: u16 = 2;

/// A small wrapper around a cpal::Device. Once opened, it owns the output stream
/// and the clip engine feeding it.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The maximum number of channels the device supports.
    max_channels: u16,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The underlying cpal device.
    device: cpal::Device,
    /// The running output. None for devices that were only listed.
    output: Option<Output>,
}

/// The output thread and the engine that schedules clips onto it.
struct Output {
    engine: ClipEngine,
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for Output {
    fn drop(&mut self) {
        self.engine.stop_all();
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Output thread panicked");
            }
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

/// Creates the stream callback: pick up new clips, mix, convert to the device format.
fn output_callback<T>(
    mut mixer: AudioMixer,
    source_rx: SourceReceiver,
) -> impl FnMut(&mut [T], &cpal::OutputCallbackInfo) + Send + 'static
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        mixer.drain(&source_rx);

        scratch.resize(data.len(), 0.0);
        mixer.process_into(&mut scratch);
        for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
            *dst = T::from_sample(src);
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    source_rx: SourceReceiver,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mixer = AudioMixer::new(config.channels);
    device.build_output_stream(
        config,
        output_callback::<T>(mixer, source_rx),
        |err| error!(err = err.to_string(), "CPAL output stream error"),
        None,
    )
}

/// Starts the output thread. The stream is created inside the thread, as cpal streams
/// can't move between threads on every platform. Returns once the stream is playing.
fn start_output_thread(
    device: cpal::Device,
    stream_config: cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    source_rx: SourceReceiver,
    stop: Arc<AtomicBool>,
) -> Result<thread::JoinHandle<()>, Box<dyn Error>> {
    let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), String>>(1);

    let handle = thread::spawn(move || {
        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, source_rx),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, source_rx),
            cpal::SampleFormat::I32 => build_stream::<i32>(&device, &stream_config, source_rx),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, source_rx),
            other => {
                let _ = ready_tx.send(Err(format!("unsupported sample format {:?}", other)));
                return;
            }
        };

        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready_tx.send(Err(format!("failed to create stream: {}", e)));
                return;
            }
        };
        if let Err(e) = stream.play() {
            let _ = ready_tx.send(Err(format!("failed to start stream: {}", e)));
            return;
        }

        info!(
            channels = stream_config.channels,
            sample_rate = stream_config.sample_rate.0,
            "CPAL output stream started"
        );
        let _ = ready_tx.send(Ok(()));

        // Keep the stream alive until the device goes away.
        while !stop.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(100));
        }
        info!("CPAL output stream stopped");
    });

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err("output thread exited before starting the stream".into()),
    }
}

impl Device {
    /// Lists cpal devices and produces the Device trait.
    pub fn list() -> Result<Vec<Box<dyn AudioDevice>>, Box<dyn Error>> {
        Ok(Device::list_cpal_devices()?
            .into_iter()
            .map(|device| {
                let device: Box<dyn AudioDevice> = Box::new(device);
                device
            })
            .collect())
    }

    /// Lists cpal devices that can output audio.
    fn list_cpal_devices() -> Result<Vec<Device>, Box<dyn Error>> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices: Vec<Device> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let Some(max_channels) = Device::max_channels(&device) else {
                    continue;
                };

                devices.push(Device {
                    name: device.name()?,
                    max_channels,
                    host_id,
                    device,
                    output: None,
                })
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    fn max_channels(device: &cpal::Device) -> Option<u16> {
        let max_channels = device
            .supported_output_configs()
            .ok()?
            .map(|config| config.channels())
            .max()?;
        (max_channels > 0).then_some(max_channels)
    }

    /// Finds the host's default output device.
    fn default_device() -> Result<Device, Box<dyn Error>> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or("no default output device")?;
        let max_channels =
            Device::max_channels(&device).ok_or("default output device has no channels")?;

        Ok(Device {
            name: device.name()?,
            max_channels,
            host_id: host.id(),
            device,
            output: None,
        })
    }

    /// Gets the given cpal device and starts its output stream.
    pub fn get(audio: &config::Audio, clips: &config::Clips) -> Result<Device, Box<dyn Error>> {
        let name = audio.device();
        let mut device = if name == DEFAULT_DEVICE {
            Device::default_device()?
        } else {
            Device::list_cpal_devices()?
                .into_iter()
                .find(|device| device.name.trim() == name)
                .ok_or_else(|| format!("no device found with name {}", name))?
        };

        let span = span!(Level::INFO, "open device (cpal)", device = %device.name);
        let _enter = span.enter();

        let sample_format = device.device.default_output_config()?.sample_format();
        let stream_config = cpal::StreamConfig {
            channels: device.max_channels.min(MAX_OUTPUT_CHANNELS),
            sample_rate: cpal::SampleRate(audio.sample_rate()),
            buffer_size: match audio.buffer_size() {
                Some(frames) => cpal::BufferSize::Fixed(frames),
                None => cpal::BufferSize::Default,
            },
        };

        let (source_tx, source_rx) = crossbeam_channel::unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let thread = start_output_thread(
            device.device.clone(),
            stream_config,
            sample_format,
            source_rx,
            stop.clone(),
        )?;

        device.output = Some(Output {
            engine: ClipEngine::new(
                clips.directory(),
                audio.sample_rate(),
                audio.max_voices(),
                source_tx,
            ),
            stop,
            thread: Some(thread),
        });

        Ok(device)
    }

    fn engine(&self) -> Result<&ClipEngine, Box<dyn Error>> {
        match &self.output {
            Some(output) => Ok(&output.engine),
            None => Err(format!("device {} has not been opened", self.name).into()),
        }
    }
}

impl AudioDevice for Device {
    fn play(&self, clip: &Clip) -> Result<(), Box<dyn Error>> {
        self.engine()?.trigger(clip)?;
        Ok(())
    }

    fn preload(&self, clips: &[Clip]) -> Result<(), Box<dyn Error>> {
        let engine = self.engine()?;
        for clip in clips {
            // A clip that is missing now may still be missing later; the trigger
            // will report it then.
            if let Err(e) = engine.preload(clip) {
                warn!(clip = clip.id(), err = e.to_string(), "Unable to preload clip");
            }
        }
        Ok(())
    }
}
