use crate::config::Numbering;
use crate::error::GpioError;

/// BCM line for each physical pin of the 40-pin header, indexed by pin - 1.
/// `None` marks power and ground pins.
const BOARD_TO_BCM: [Option<u8>; 40] = [
    None,     // 1  3.3V
    None,     // 2  5V
    Some(2),  // 3
    None,     // 4  5V
    Some(3),  // 5
    None,     // 6  GND
    Some(4),  // 7
    Some(14), // 8
    None,     // 9  GND
    Some(15), // 10
    Some(17), // 11
    Some(18), // 12
    Some(27), // 13
    None,     // 14 GND
    Some(22), // 15
    Some(23), // 16
    None,     // 17 3.3V
    Some(24), // 18
    Some(10), // 19
    None,     // 20 GND
    Some(9),  // 21
    Some(25), // 22
    Some(11), // 23
    Some(8),  // 24
    None,     // 25 GND
    Some(7),  // 26
    Some(0),  // 27 ID_SD
    Some(1),  // 28 ID_SC
    Some(5),  // 29
    None,     // 30 GND
    Some(6),  // 31
    Some(12), // 32
    Some(13), // 33
    None,     // 34 GND
    Some(19), // 35
    Some(16), // 36
    Some(26), // 37
    Some(20), // 38
    None,     // 39 GND
    Some(21), // 40
];

/// Translate a configured pin number into the BCM line rppal addresses.
pub fn to_bcm(pin: u8, numbering: Numbering) -> Result<u8, GpioError> {
    match numbering {
        Numbering::Bcm => Ok(pin),
        Numbering::Board => pin
            .checked_sub(1)
            .and_then(|index| BOARD_TO_BCM.get(usize::from(index)).copied().flatten())
            .ok_or(GpioError::NotGpio(pin)),
    }
}
