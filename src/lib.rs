pub mod configuration;

pub mod magdist {
    pub mod mfderror;
    pub mod truncation;
    pub mod magfreqdist;
    pub mod incrementalmagfreqdist;
    pub mod gutenbergrichtermagfreqdist;
    pub mod taperedgrmagfreqdist;
    pub mod gaussianmagfreqdist;
    pub mod youngscoppersmithmagfreqdist;
    pub mod singlemagfreqdist;
    pub mod summedmagfreqdist;
}

pub mod manager {
    pub mod namedobject;
    pub mod managererror;
    pub mod manager;
}

pub mod math {
    pub mod moment;
    pub mod series {
        pub mod discretizedfunction;
        pub mod evenlydiscretizedseries;
        pub mod arbitrarilydiscretizedseries;
    }
}
