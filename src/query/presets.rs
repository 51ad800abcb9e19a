//! Standard JVM query set
//!
//! Attributes every HotSpot JVM exposes through the platform MBean server.

use super::metric::MetricQuery;

const CLASS_LOADING: &str = "java.lang:type=ClassLoading";
const GARBAGE_COLLECTORS: &str = "java.lang:type=GarbageCollector,*";
const MEMORY: &str = "java.lang:type=Memory";
const OPERATING_SYSTEM: &str = "java.lang:type=OperatingSystem";
const RUNTIME: &str = "java.lang:type=Runtime";
const THREADING: &str = "java.lang:type=Threading";
const MEMORY_POOLS: &str = "java.lang:type=MemoryPool,*";

const USAGE_KEYS: [&str; 4] = ["committed", "init", "max", "used"];

/// Class loading, GC, memory, OS, runtime, threading and memory pool queries
pub fn jvm_queries() -> Vec<MetricQuery> {
    let mut queries = Vec::new();

    for attribute in ["LoadedClassCount", "UnloadedClassCount", "TotalLoadedClassCount"] {
        queries.push(MetricQuery::new(CLASS_LOADING).with_attribute(attribute));
    }

    for attribute in ["CollectionTime", "CollectionCount"] {
        queries.push(MetricQuery::new(GARBAGE_COLLECTORS).with_attribute(attribute));
    }

    for attribute in ["HeapMemoryUsage", "NonHeapMemoryUsage"] {
        for key in USAGE_KEYS {
            queries.push(
                MetricQuery::new(MEMORY)
                    .with_attribute(attribute)
                    .with_attribute_key(key),
            );
        }
    }

    for attribute in [
        "OpenFileDescriptorCount",
        "MaxFileDescriptorCount",
        "CommittedVirtualMemorySize",
        "TotalSwapSpaceSize",
        "FreeSwapSpaceSize",
        "ProcessCpuTime",
        "FreePhysicalMemorySize",
        "TotalPhysicalMemorySize",
        "SystemCpuLoad",
        "ProcessCpuLoad",
        "SystemLoadAverage",
    ] {
        queries.push(MetricQuery::new(OPERATING_SYSTEM).with_attribute(attribute));
    }

    queries.push(MetricQuery::new(RUNTIME).with_attribute("Uptime"));

    for attribute in [
        "ThreadCount",
        "PeakThreadCount",
        "DaemonThreadCount",
        "TotalStartedThreadCount",
    ] {
        queries.push(MetricQuery::new(THREADING).with_attribute(attribute));
    }

    for key in USAGE_KEYS {
        queries.push(
            MetricQuery::new(MEMORY_POOLS)
                .with_attribute("Usage")
                .with_attribute_key(key),
        );
    }

    queries
}
