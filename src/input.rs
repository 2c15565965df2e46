//! Keystroke simulation
//!
//! On Linux this drives a uinput virtual keyboard through evdev, which works
//! on both X11 and Wayland. Other platforms get [`UnsupportedKeys`].

use anyhow::Result;

/// Shortcut keystrokes used by the text replacement flow
pub trait KeySimulator: Send + Sync {
    /// Ctrl+X in the focused application
    fn cut(&self) -> Result<()>;

    /// Ctrl+V in the focused application
    fn paste(&self) -> Result<()>;
}

/// Pick the keystroke backend for this platform
pub fn system_keys() -> Box<dyn KeySimulator> {
    #[cfg(target_os = "linux")]
    {
        match linux::VirtualKeyboard::new() {
            Ok(kb) => return Box::new(kb),
            Err(e) => {
                tracing::warn!("⚠️ Could not create virtual keyboard: {}", e);
                tracing::warn!("   Add your user to the 'input' group to enable text replacement");
            }
        }
    }
    Box::new(UnsupportedKeys)
}

/// Backend for platforms without keystroke simulation
pub struct UnsupportedKeys;

impl KeySimulator for UnsupportedKeys {
    fn cut(&self) -> Result<()> {
        Err(anyhow::anyhow!("Keystroke simulation is not available"))
    }

    fn paste(&self) -> Result<()> {
        Err(anyhow::anyhow!("Keystroke simulation is not available"))
    }
}

#[cfg(target_os = "linux")]
pub mod linux {
    use super::KeySimulator;
    use anyhow::{Context, Result};
    use evdev::{uinput::VirtualDeviceBuilder, AttributeSet, Key};
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;
    use tracing::{debug, info};

    /// Virtual keyboard for simulating shortcuts
    pub struct VirtualKeyboard {
        device: Mutex<evdev::uinput::VirtualDevice>,
    }

    impl VirtualKeyboard {
        /// Create a new virtual keyboard device
        pub fn new() -> Result<Self> {
            let mut keys = AttributeSet::<Key>::new();
            for key in [
                Key::KEY_LEFTCTRL,
                Key::KEY_LEFTSHIFT,
                Key::KEY_X,
                Key::KEY_C,
                Key::KEY_V,
            ] {
                keys.insert(key);
            }

            let device = VirtualDeviceBuilder::new()?
                .name("ClipMind Virtual Keyboard")
                .with_keys(&keys)?
                .build()
                .context("Failed to create virtual keyboard")?;

            info!("⌨️ Virtual keyboard created");
            Ok(Self {
                device: Mutex::new(device),
            })
        }

        fn emit(&self, key: Key, value: i32) -> Result<()> {
            let mut device = self
                .device
                .lock()
                .map_err(|e| anyhow::anyhow!("keyboard lock poisoned: {}", e))?;
            device.emit(&[evdev::InputEvent::new(
                evdev::EventType::KEY,
                key.code(),
                value,
            )])?;
            Ok(())
        }

        /// Type a key combination (e.g., Ctrl+V)
        pub fn key_combo(&self, modifier: Key, key: Key) -> Result<()> {
            debug!("Key combo: {:?} + {:?}", modifier, key);
            self.emit(modifier, 1)?;
            thread::sleep(Duration::from_millis(5));
            self.emit(key, 1)?;
            thread::sleep(Duration::from_millis(10));
            self.emit(key, 0)?;
            thread::sleep(Duration::from_millis(5));
            self.emit(modifier, 0)?;
            Ok(())
        }
    }

    impl KeySimulator for VirtualKeyboard {
        fn cut(&self) -> Result<()> {
            self.key_combo(Key::KEY_LEFTCTRL, Key::KEY_X)
        }

        fn paste(&self) -> Result<()> {
            self.key_combo(Key::KEY_LEFTCTRL, Key::KEY_V)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_keys_fail() {
        assert!(UnsupportedKeys.cut().is_err());
        assert!(UnsupportedKeys.paste().is_err());
    }
}
