/*++

Licensed under the Apache-2.0 license.

File Name:

    printer.rs

Abstract:

    File contains support routines and macros used to log attestation
    service progress.

--*/
use core::convert::Infallible;
use ufmt::{uDisplay, uWrite};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

#[derive(Default)]
pub struct Printer;

impl uWrite for Printer {
    type Error = Infallible;

    /// Firmware builds have no console; log output is dropped.
    #[cfg(not(feature = "std"))]
    #[inline(never)]
    fn write_str(&mut self, _str: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Writes a string slice to stdout.
    #[cfg(feature = "std")]
    fn write_str(&mut self, str: &str) -> Result<(), Self::Error> {
        print!("{str}");
        Ok(())
    }
}

#[macro_export]
macro_rules! cprint {
    ($($tt:tt)*) => {{
        let _ = ufmt::uwrite!(&mut $crate::printer::Printer::default(), $($tt)*);
    }}
}

#[macro_export]
macro_rules! cprintln {
    ($($tt:tt)*) => {{
        let _ = ufmt::uwriteln!(&mut $crate::printer::Printer::default(), $($tt)*);
    }}
}

/// Upper-case hex rendering of a byte slice for log lines.
pub struct HexBytes<'a>(pub &'a [u8]);

impl uDisplay for HexBytes<'_> {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        for &x in self.0.iter() {
            f.write_char(HEX_DIGITS[usize::from(x >> 4)] as char)?;
            f.write_char(HEX_DIGITS[usize::from(x & 0xf)] as char)?;
        }
        Ok(())
    }
}
