//! Cross-module checks of the kinematic chain against machine calibration values
