/// Declares a schema type for a sled tree without deriving codecs.
#[macro_export]
macro_rules! define_table_without_codec {
    ($(#[$docs:meta])+ ( $table_name:ident ) $key:ty => $value:ty) => {
        $(#[$docs])+
        ///
        #[doc = concat!("Takes [`", stringify!($key), "`] as a key and returns [`", stringify!($value), "`]")]
        #[derive(Clone, Copy, Debug, Default)]
        pub(crate) struct $table_name;

        impl $crate::typed::Schema for $table_name {
            const TREE_NAME: $crate::typed::TreeName = $crate::typed::TreeName(::core::stringify!($table_name));
            type Key = $key;
            type Value = $value;
        }

        impl ::std::fmt::Display for $table_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::core::write!(f, "{}", ::core::stringify!($table_name))
            }
        }
    };
}

/// Declares a schema whose values are borsh-encoded.
///
/// The key type must already have a [`KeyCodec`](crate::typed::KeyCodec) for the table.
#[macro_export]
macro_rules! define_table_with_borsh_codec {
    ($(#[$docs:meta])+ ($table_name:ident) $key:ty => $value:ty) => {
        $crate::define_table_without_codec!($(#[$docs])+ ( $table_name ) $key => $value);
        $crate::impl_borsh_value_codec!($table_name, $value);
    };
}

#[macro_export]
macro_rules! impl_borsh_value_codec {
    ($table_name:ident, $value:ty) => {
        impl $crate::typed::ValueCodec<$table_name> for $value {
            fn encode_value(&self) -> $crate::typed::CodecResult<Vec<u8>> {
                ::borsh::to_vec(self).map_err(|source| $crate::typed::CodecError::SerializationFailed {
                    schema: ::core::stringify!($table_name),
                    source,
                })
            }

            fn decode_value(data: &[u8]) -> $crate::typed::CodecResult<Self> {
                ::borsh::from_slice(data).map_err(|source| {
                    $crate::typed::CodecError::DeserializationFailed {
                        schema: ::core::stringify!($table_name),
                        source,
                    }
                })
            }
        }
    };
}

/// Big-endian integer values.
#[macro_export]
macro_rules! impl_integer_value_codec {
    ($table_name:ident, $value:ty) => {
        impl $crate::typed::ValueCodec<$table_name> for $value {
            fn encode_value(&self) -> $crate::typed::CodecResult<Vec<u8>> {
                Ok(self.to_be_bytes().to_vec())
            }

            fn decode_value(data: &[u8]) -> $crate::typed::CodecResult<Self> {
                const SIZE: usize = ::core::mem::size_of::<$value>();
                let bytes = $crate::typed::fixed::<SIZE>(::core::stringify!($table_name), data)?;
                Ok(<$value>::from_be_bytes(bytes))
            }
        }
    };
}

/// Values stored in bitcoin consensus encoding.
#[macro_export]
macro_rules! impl_consensus_value_codec {
    ($table_name:ident, $value:ty) => {
        impl $crate::typed::ValueCodec<$table_name> for $value {
            fn encode_value(&self) -> $crate::typed::CodecResult<Vec<u8>> {
                Ok(::bitcoin::consensus::serialize(self))
            }

            fn decode_value(data: &[u8]) -> $crate::typed::CodecResult<Self> {
                ::bitcoin::consensus::deserialize(data).map_err(|e| {
                    $crate::typed::CodecError::Other(format!(
                        "{}: {e}",
                        ::core::stringify!($table_name)
                    ))
                })
            }
        }
    };
}

#[macro_export]
macro_rules! define_sled_database {
    (
        $(#[$meta:meta])*
        pub struct $db_name:ident {
            $($vis:vis $field:ident: $schema:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $db_name {
            $(
                $vis $field: $crate::typed::SledTree<$schema>,
            )*
            config: $crate::SledDbConfig,
        }

        impl $db_name {
            pub fn new(
                db: ::std::sync::Arc<$crate::typed::SledDb>,
                config: $crate::SledDbConfig,
            ) -> ::drivechain_db_types::DbResult<Self> {
                Ok(Self {
                    $(
                        $field: db.get_tree()?,
                    )*
                    config,
                })
            }
        }
    };
}

#[cfg(test)]
#[macro_export]
macro_rules! sled_db_test_setup {
    ($db_type:ty) => {
        fn setup_db() -> $db_type {
            let db = ::sled::Config::new().temporary(true).open().unwrap();
            let sled_db = $crate::typed::SledDb::new(::std::sync::Arc::new(db));
            <$db_type>::new(::std::sync::Arc::new(sled_db), $crate::SledDbConfig::test()).unwrap()
        }
    };
}
