use std::fmt;

macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident = $code:literal => $label:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant,)+
            Unrecognized(i32),
        }

        impl $name {
            pub fn from_code(code: i32) -> Self {
                match code {
                    $($code => $name::$variant,)+
                    other => $name::Unrecognized(other),
                }
            }

            pub fn code(self) -> i32 {
                match self {
                    $($name::$variant => $code,)+
                    $name::Unrecognized(code) => code,
                }
            }

            pub fn is_recognized(self) -> bool {
                !matches!(self, $name::Unrecognized(_))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($name::$variant => f.write_str($label),)+
                    $name::Unrecognized(code) => write!(f, "{code}"),
                }
            }
        }
    };
}

open_enum! {
    /// prtAlertSeverityLevel
    AlertSeverityLevel {
        Other = 1 => "other",
        Critical = 3 => "critical",
        Warning = 4 => "warning",
        WarningBinaryChangeEvent = 5 => "warningBinaryChangeEvent",
    }
}

open_enum! {
    /// prtAlertTrainingLevel
    AlertTrainingLevel {
        Other = 1 => "other",
        Unknown = 2 => "unknown",
        Untrained = 3 => "untrained",
        Trained = 4 => "trained",
        FieldService = 5 => "fieldService",
        Management = 6 => "management",
        NoInterventionRequired = 7 => "noInterventionRequired",
    }
}

open_enum! {
    /// prtAlertGroup
    AlertGroup {
        Other = 1 => "other",
        Unknown = 2 => "unknown",
        HostResourcesStorageTable = 3 => "hostResourcesMIBStorageTable",
        HostResourcesDeviceTable = 4 => "hostResourcesMIBDeviceTable",
        GeneralPrinter = 5 => "generalPrinter",
        Cover = 6 => "cover",
        Localization = 7 => "localization",
        Input = 8 => "input",
        Output = 9 => "output",
        Marker = 10 => "marker",
        MarkerSupplies = 11 => "markerSupplies",
        MarkerColorant = 12 => "markerColorant",
        MediaPath = 13 => "mediaPath",
        Channel = 14 => "channel",
        Interpreter = 15 => "interpreter",
        ConsoleDisplayBuffer = 16 => "consoleDisplayBuffer",
        ConsoleLights = 17 => "consoleLights",
        Alert = 18 => "alert",
        FinDevice = 30 => "finDevice",
        FinSupply = 31 => "finSupply",
        FinSupplyMediaInput = 32 => "finSupplyMediaInput",
        FinAttribute = 33 => "finAttribute",
    }
}

open_enum! {
    /// prtAlertCode
    AlertCode {
        Other = 1 => "other",
        Unknown = 2 => "unknown",
        CoverOpen = 3 => "coverOpen",
        CoverClosed = 4 => "coverClosed",
        InterlockOpen = 5 => "interlockOpen",
        InterlockClosed = 6 => "interlockClosed",
        ConfigurationChange = 7 => "configurationChange",
        Jam = 8 => "jam",
        SubunitMissing = 9 => "subunitMissing",
        SubunitLifeAlmostOver = 10 => "subunitLifeAlmostOver",
        SubunitLifeOver = 11 => "subunitLifeOver",
        SubunitAlmostEmpty = 12 => "subunitAlmostEmpty",
        SubunitEmpty = 13 => "subunitEmpty",
        SubunitAlmostFull = 14 => "subunitAlmostFull",
        SubunitFull = 15 => "subunitFull",
        SubunitNearLimit = 16 => "subunitNearLimit",
        SubunitAtLimit = 17 => "subunitAtLimit",
        SubunitOpened = 18 => "subunitOpened",
        SubunitClosed = 19 => "subunitClosed",
        SubunitTurnedOn = 20 => "subunitTurnedOn",
        SubunitTurnedOff = 21 => "subunitTurnedOff",
        SubunitOffline = 22 => "subunitOffline",
        SubunitPowerSaver = 23 => "subunitPowerSaver",
        SubunitWarmingUp = 24 => "subunitWarmingUp",
        SubunitAdded = 25 => "subunitAdded",
        SubunitRemoved = 26 => "subunitRemoved",
        SubunitResourceAdded = 27 => "subunitResourceAdded",
        SubunitResourceRemoved = 28 => "subunitResourceRemoved",
        SubunitRecoverableFailure = 29 => "subunitRecoverableFailure",
        SubunitUnrecoverableFailure = 30 => "subunitUnrecoverableFailure",
        SubunitRecoverableStorageError = 31 => "subunitRecoverableStorageError",
        SubunitUnrecoverableStorageError = 32 => "subunitUnrecoverableStorageError",
        SubunitMotorFailure = 33 => "subunitMotorFailure",
        SubunitMemoryExhausted = 34 => "subunitMemoryExhausted",
        SubunitUnderTemperature = 35 => "subunitUnderTemperature",
        SubunitOverTemperature = 36 => "subunitOverTemperature",
        SubunitTimingFailure = 37 => "subunitTimingFailure",
        SubunitThermistorFailure = 38 => "subunitThermistorFailure",
        AlertRemovalOfBinaryChangeEntry = 180 => "alertRemovalOfBinaryChangeEntry",
        DoorOpen = 501 => "doorOpen",
        DoorClosed = 502 => "doorClosed",
        PowerUp = 503 => "powerUp",
        PowerDown = 504 => "powerDown",
        PrinterNmsReset = 505 => "printerNMSReset",
        PrinterManualReset = 506 => "printerManualReset",
        PrinterReadyToPrint = 507 => "printerReadyToPrint",
        InputMediaTrayMissing = 801 => "inputMediaTrayMissing",
        InputMediaSizeChange = 802 => "inputMediaSizeChange",
        InputMediaWeightChange = 803 => "inputMediaWeightChange",
        InputMediaTypeChange = 804 => "inputMediaTypeChange",
        InputMediaColorChange = 805 => "inputMediaColorChange",
        InputMediaFormPartsChange = 806 => "inputMediaFormPartsChange",
        InputMediaSupplyLow = 807 => "inputMediaSupplyLow",
        InputMediaSupplyEmpty = 808 => "inputMediaSupplyEmpty",
        InputMediaChangeRequest = 809 => "inputMediaChangeRequest",
        InputManualInputRequest = 810 => "inputManualInputRequest",
        InputTrayPositionFailure = 811 => "inputTrayPositionFailure",
        InputTrayElevationFailure = 812 => "inputTrayElevationFailure",
        InputCannotFeedSizeSelected = 813 => "inputCannotFeedSizeSelected",
        OutputMediaTrayMissing = 901 => "outputMediaTrayMissing",
        OutputMediaTrayAlmostFull = 902 => "outputMediaTrayAlmostFull",
        OutputMediaTrayFull = 903 => "outputMediaTrayFull",
        OutputMailboxSelectFailure = 904 => "outputMailboxSelectFailure",
        MarkerFuserUnderTemperature = 1001 => "markerFuserUnderTemperature",
        MarkerFuserOverTemperature = 1002 => "markerFuserOverTemperature",
        MarkerFuserTimingFailure = 1003 => "markerFuserTimingFailure",
        MarkerFuserThermistorFailure = 1004 => "markerFuserThermistorFailure",
        MarkerAdjustingPrintQuality = 1005 => "markerAdjustingPrintQuality",
        MarkerTonerEmpty = 1101 => "markerTonerEmpty",
        MarkerInkEmpty = 1102 => "markerInkEmpty",
        MarkerPrintRibbonEmpty = 1103 => "markerPrintRibbonEmpty",
        MarkerTonerAlmostEmpty = 1104 => "markerTonerAlmostEmpty",
        MarkerInkAlmostEmpty = 1105 => "markerInkAlmostEmpty",
        MarkerPrintRibbonAlmostEmpty = 1106 => "markerPrintRibbonAlmostEmpty",
        MarkerWasteTonerReceptacleAlmostFull = 1107 => "markerWasteTonerReceptacleAlmostFull",
        MarkerWasteInkReceptacleAlmostFull = 1108 => "markerWasteInkReceptacleAlmostFull",
        MarkerWasteTonerReceptacleFull = 1109 => "markerWasteTonerReceptacleFull",
        MarkerWasteInkReceptacleFull = 1110 => "markerWasteInkReceptacleFull",
        MarkerOpcLifeAlmostOver = 1111 => "markerOpcLifeAlmostOver",
        MarkerOpcLifeOver = 1112 => "markerOpcLifeOver",
        MarkerDeveloperAlmostEmpty = 1113 => "markerDeveloperAlmostEmpty",
        MarkerDeveloperEmpty = 1114 => "markerDeveloperEmpty",
        MarkerTonerCartridgeMissing = 1115 => "markerTonerCartridgeMissing",
        MediaPathMediaTrayMissing = 1301 => "mediaPathMediaTrayMissing",
        MediaPathMediaTrayAlmostFull = 1302 => "mediaPathMediaTrayAlmostFull",
        MediaPathMediaTrayFull = 1303 => "mediaPathMediaTrayFull",
        MediaPathCannotDuplexMediaSelected = 1304 => "mediaPathCannotDuplexMediaSelected",
        InterpreterMemoryIncrease = 1501 => "interpreterMemoryIncrease",
        InterpreterMemoryDecrease = 1502 => "interpreterMemoryDecrease",
        InterpreterCartridgeAdded = 1503 => "interpreterCartridgeAdded",
        InterpreterCartridgeDeleted = 1504 => "interpreterCartridgeDeleted",
        InterpreterResourceAdded = 1505 => "interpreterResourceAdded",
        InterpreterResourceDeleted = 1506 => "interpreterResourceDeleted",
        InterpreterResourceUnavailable = 1507 => "interpreterResourceUnavailable",
        InterpreterComplexPageEncountered = 1509 => "interpreterComplexPageEncountered",
    }
}

open_enum! {
    /// prtMarkerSuppliesClass
    SupplyClass {
        Other = 1 => "other",
        SupplyThatIsConsumed = 3 => "supplyThatIsConsumed",
        ReceptacleThatIsFilled = 4 => "receptacleThatIsFilled",
    }
}

open_enum! {
    /// prtMarkerSuppliesType
    SupplyType {
        Other = 1 => "other",
        Unknown = 2 => "unknown",
        Toner = 3 => "toner",
        WasteToner = 4 => "wasteToner",
        Ink = 5 => "ink",
        InkCartridge = 6 => "inkCartridge",
        InkRibbon = 7 => "inkRibbon",
        WasteInk = 8 => "wasteInk",
        Opc = 9 => "opc",
        Developer = 10 => "developer",
        FuserOil = 11 => "fuserOil",
        SolidWax = 12 => "solidWax",
        RibbonWax = 13 => "ribbonWax",
        WasteWax = 14 => "wasteWax",
        Fuser = 15 => "fuser",
        CoronaWire = 16 => "coronaWire",
        FuserOilWick = 17 => "fuserOilWick",
        CleanerUnit = 18 => "cleanerUnit",
        FuserCleaningPad = 19 => "fuserCleaningPad",
        TransferUnit = 20 => "transferUnit",
        TonerCartridge = 21 => "tonerCartridge",
        FuserOiler = 22 => "fuserOiler",
        Water = 23 => "water",
        WasteWater = 24 => "wasteWater",
        GlueWaterAdditive = 25 => "glueWaterAdditive",
        WastePaper = 26 => "wastePaper",
        BindingSupply = 27 => "bindingSupply",
        BandingSupply = 28 => "bandingSupply",
        StitchingWire = 29 => "stitchingWire",
        ShrinkWrap = 30 => "shrinkWrap",
        PaperWrap = 31 => "paperWrap",
        Staples = 32 => "staples",
        Inserts = 33 => "inserts",
        Covers = 34 => "covers",
    }
}

open_enum! {
    /// prtMarkerSuppliesSupplyUnit
    SupplyUnit {
        Other = 1 => "other",
        Unknown = 2 => "unknown",
        TenThousandthsOfInches = 3 => "tenThousandthsOfInches",
        Micrometers = 4 => "micrometers",
        Impressions = 7 => "impressions",
        Sheets = 8 => "sheets",
        Hours = 11 => "hours",
        ThousandthsOfOunces = 12 => "thousandthsOfOunces",
        TenthsOfGrams = 13 => "tenthsOfGrams",
        HundrethsOfFluidOunces = 14 => "hundrethsOfFluidOunces",
        TenthsOfMilliliters = 15 => "tenthsOfMilliliters",
        Feet = 16 => "feet",
        Meters = 17 => "meters",
        Items = 18 => "items",
        Percent = 19 => "percent",
    }
}

open_enum! {
    /// prtCoverStatus
    CoverStatus {
        Other = 1 => "other",
        Unknown = 2 => "unknown",
        CoverOpen = 3 => "coverOpen",
        CoverClosed = 4 => "coverClosed",
        InterlockOpen = 5 => "interlockOpen",
        InterlockClosed = 6 => "interlockClosed",
    }
}

open_enum! {
    /// prtConsoleColor
    ConsoleColor {
        Unknown = 2 => "unknown",
        White = 3 => "white",
        Red = 4 => "red",
        Green = 5 => "green",
        Blue = 6 => "blue",
        Cyan = 7 => "cyan",
        Magenta = 8 => "magenta",
        Yellow = 9 => "yellow",
        Orange = 10 => "orange",
    }
}

impl ConsoleColor {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            ConsoleColor::Red => (255, 0, 0),
            ConsoleColor::Green => (0, 255, 0),
            ConsoleColor::Blue => (0, 0, 255),
            ConsoleColor::Cyan => (0, 255, 255),
            ConsoleColor::Magenta => (255, 0, 255),
            ConsoleColor::Yellow => (255, 255, 0),
            ConsoleColor::Orange => (255, 128, 0),
            _ => (255, 255, 255),
        }
    }
}

open_enum! {
    /// prtInputType
    InputType {
        Other = 1 => "other",
        Unknown = 2 => "unknown",
        SheetFeedAutoRemovableTray = 3 => "sheetFeedAutoRemovableTray",
        SheetFeedAutoNonRemovableTray = 4 => "sheetFeedAutoNonRemovableTray",
        SheetFeedManual = 5 => "sheetFeedManual",
        ContinuousRoll = 6 => "continuousRoll",
        ContinuousFanFold = 7 => "continuousFanFold",
    }
}

open_enum! {
    /// prtOutputType
    OutputType {
        Other = 1 => "other",
        Unknown = 2 => "unknown",
        RemovableBin = 3 => "removableBin",
        UnRemovableBin = 4 => "unRemovableBin",
        ContinuousRollDevice = 5 => "continuousRollDevice",
        MailBox = 6 => "mailBox",
        ContinuousFanFold = 7 => "continuousFanFold",
    }
}

open_enum! {
    /// prtOutputStackingOrder
    StackingOrder {
        Unknown = 2 => "unknown",
        FirstToLast = 3 => "firstToLast",
        LastToFirst = 4 => "lastToFirst",
    }
}

open_enum! {
    /// prtOutputPageDeliveryOrientation
    PageDeliveryOrientation {
        FaceUp = 3 => "faceUp",
        FaceDown = 4 => "faceDown",
    }
}

open_enum! {
    /// MediaUnit
    MediaUnit {
        TenThousandthsOfInches = 3 => "tenThousandthsOfInches",
        Micrometers = 4 => "micrometers",
    }
}

open_enum! {
    /// CapacityUnit
    CapacityUnit {
        Other = 1 => "other",
        Unknown = 2 => "unknown",
        TenThousandthsOfInches = 3 => "tenThousandthsOfInches",
        Micrometers = 4 => "micrometers",
        Sheets = 8 => "sheets",
        Feet = 16 => "feet",
        Meters = 17 => "meters",
        Items = 18 => "items",
        Percent = 19 => "percent",
    }
}

open_enum! {
    /// PresentOnOff
    PresentOnOff {
        Other = 1 => "other",
        On = 3 => "on",
        Off = 4 => "off",
        NotPresent = 5 => "notPresent",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_are_kept() {
        let code = AlertCode::from_code(9999);
        assert_eq!(code, AlertCode::Unrecognized(9999));
        assert_eq!(code.code(), 9999);
        assert!(!code.is_recognized());
        assert_eq!(code.to_string(), "9999");
    }

    #[test]
    fn known_codes_use_mib_labels() {
        assert_eq!(AlertCode::from_code(503), AlertCode::PowerUp);
        assert_eq!(CoverStatus::from_code(3).to_string(), "coverOpen");
        assert_eq!(SupplyClass::SupplyThatIsConsumed.code(), 3);
        assert_eq!(AlertSeverityLevel::from_code(-2), AlertSeverityLevel::Unrecognized(-2));
    }

    #[test]
    fn console_colours() {
        assert_eq!(ConsoleColor::Orange.rgb(), (255, 128, 0));
        assert_eq!(ConsoleColor::from_code(42).rgb(), (255, 255, 255));
    }
}
