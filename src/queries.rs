//! GraphQL operation documents

pub const AUTHENTICATE_USER: &str = r#"
  mutation AuthenticateUser($email: String!, $password: String!) {
    authenticateUser(email: $email, password: $password) {
      access_token
      refresh_token
    }
  }
"#;

pub const UPDATE_TOKEN: &str = r#"
  mutation UpdateToken($refreshToken: String!) {
    updateToken(refreshToken: $refreshToken) {
      token
    }
  }
"#;

pub const GET_ALL_LOCATIONS: &str = r#"
  query GetAllLocations($customerId: Int!) {
    getAllLocations(customerId: $customerId) {
      id
      name
      parentId
      locationType
    }
  }
"#;

pub const GET_LOCATION: &str = r#"
  query GetLocation($id: Int!) {
    getLocation(id: $id) {
      id
      parentId
      name
      locationType
      lastModifiedTimestamp
    }
  }
"#;

pub const FILTER_EQUIPMENT: &str = r#"
  query FilterEquipment(
    $locationIds: [Int]
    $customerId: Int!
    $equipmentType: String
    $cursor: String
  ) {
    filterEquipment(
      customerId: $customerId
      locationIds: $locationIds
      equipmentType: $equipmentType
      cursor: $cursor
    ) {
      items {
        name
        id
        locationId
        profileId
        inventoryId
        channel
        model
        alarmsCount
        profile {
          name
        }
        status {
          protocol {
            details {
              reportedIpV4Addr
              reportedMacAddr
              manufacturer
            }
          }
          osPerformance {
            details {
              uptimeInSeconds
            }
          }
          radioUtilization {
            details {
              reportedIpV4Addr
              capacityDetails
              noiseFloorDetails
            }
          }
          clientDetails {
            details {
              numClientsPerRadio
            }
          }
        }
      }
      context {
        lastPage
        cursor
      }
    }
  }
"#;

pub const GET_EQUIPMENT: &str = r#"
  query GetEquipment($id: ID!) {
    getEquipment(id: $id) {
      id
      equipmentType
      inventoryId
      customerId
      profileId
      locationId
      name
      latitude
      longitude
      serial
      lastModifiedTimestamp
      details
      profile {
        id
        name
        childProfiles {
          id
          name
          details
        }
      }
      status {
        firmware {
          detailsJSON
        }
        protocol {
          detailsJSON
          details {
            reportedMacAddr
            manufacturer
          }
        }
        radioUtilization {
          detailsJSON
        }
        clientDetails {
          detailsJSON
          details {
            numClientsPerRadio
          }
        }
        osPerformance {
          detailsJSON
        }
      }
      model
      alarmsCount
      alarms {
        severity
        alarmCode
        details
        createdTimestamp
      }
    }
  }
"#;

pub const UPDATE_EQUIPMENT: &str = r#"
  mutation UpdateEquipment(
    $id: ID!
    $equipmentType: String!
    $inventoryId: String!
    $customerId: ID!
    $profileId: ID!
    $locationId: ID!
    $name: String!
    $latitude: String
    $longitude: String
    $serial: String
    $lastModifiedTimestamp: String
    $details: JSONObject
  ) {
    updateEquipment(
      id: $id
      equipmentType: $equipmentType
      inventoryId: $inventoryId
      customerId: $customerId
      profileId: $profileId
      locationId: $locationId
      name: $name
      latitude: $latitude
      longitude: $longitude
      serial: $serial
      lastModifiedTimestamp: $lastModifiedTimestamp
      details: $details
    ) {
      id
      equipmentType
      inventoryId
      customerId
      profileId
      locationId
      name
      latitude
      longitude
      serial
      lastModifiedTimestamp
      details
    }
  }
"#;

pub const GET_ALL_FIRMWARE: &str = r#"
  query GetAllFirmware($modelId: String) {
    getAllFirmware(modelId: $modelId) {
      id
      modelId
      versionName
      description
      filename
      commit
      releaseDate
    }
  }
"#;

pub const UPDATE_EQUIPMENT_FIRMWARE: &str = r#"
  mutation UpdateEquipmentFirmware($equipmentId: ID!, $firmwareVersionId: ID!) {
    updateEquipmentFirmware(equipmentId: $equipmentId, firmwareVersionId: $firmwareVersionId) {
      success
    }
  }
"#;

pub const FILTER_SERVICE_METRICS: &str = r#"
  query FilterServiceMetrics(
    $customerId: ID!
    $fromTime: String!
    $toTime: String!
    $equipmentIds: [ID]
    $dataTypes: [String]
    $limit: Int
    $cursor: String
  ) {
    filterServiceMetrics(
      customerId: $customerId
      fromTime: $fromTime
      toTime: $toTime
      equipmentIds: $equipmentIds
      dataTypes: $dataTypes
      limit: $limit
      cursor: $cursor
    ) {
      items {
        dataType
        createdTimestamp
        equipmentId
        details
      }
      context {
        cursor
        lastPage
      }
    }
  }
"#;

pub const GET_ALL_PROFILES: &str = r#"
  query GetAllProfiles($customerId: ID!, $cursor: String, $type: String, $limit: Int) {
    getAllProfiles(customerId: $customerId, cursor: $cursor, type: $type, limit: $limit) {
      items {
        id
        name
        profileType
        details
        childProfiles {
          id
          name
          details
        }
      }
      context {
        cursor
        lastPage
      }
    }
  }
"#;

pub const GET_PROFILE: &str = r#"
  query GetProfile($id: ID!) {
    getProfile(id: $id) {
      id
      profileType
      customerId
      name
      childProfiles {
        id
        name
        profileType
        details
      }
      childProfileIds
      createdTimestamp
      lastModifiedTimestamp
      details
    }
  }
"#;

pub const CREATE_PROFILE: &str = r#"
  mutation CreateProfile(
    $profileType: String!
    $customerId: Int!
    $name: String!
    $childProfileIds: [Int]
    $details: JSONObject
  ) {
    createProfile(
      profileType: $profileType
      customerId: $customerId
      name: $name
      childProfileIds: $childProfileIds
      details: $details
    ) {
      profileType
      customerId
      name
      childProfileIds
      details
    }
  }
"#;

pub const UPDATE_PROFILE: &str = r#"
  mutation UpdateProfile(
    $id: ID!
    $profileType: String!
    $customerId: ID!
    $name: String!
    $childProfileIds: [ID]
    $lastModifiedTimestamp: String
    $details: JSONObject
  ) {
    updateProfile(
      id: $id
      profileType: $profileType
      customerId: $customerId
      name: $name
      childProfileIds: $childProfileIds
      lastModifiedTimestamp: $lastModifiedTimestamp
      details: $details
    ) {
      id
      profileType
      customerId
      name
      childProfileIds
      lastModifiedTimestamp
      details
    }
  }
"#;

pub const DELETE_PROFILE: &str = r#"
  mutation DeleteProfile($id: ID!) {
    deleteProfile(id: $id) {
      id
    }
  }
"#;

pub const FILE_UPLOAD: &str = r#"
  mutation FileUpload($fileName: String, $file: Upload) {
    fileUpload(fileName: $fileName, file: $file) {
      fileName
      baseUrl
    }
  }
"#;

pub const FILTER_CLIENT_SESSIONS: &str = r#"
  query FilterClientSessions($customerId: Int!, $cursor: String) {
    getAllClientSessions(customerId: $customerId, cursor: $cursor) {
      items {
        id
        macAddress
        ipAddress
        hostname
        ssid
        radioType
        signal
        equipment {
          name
        }
      }
      context {
        lastPage
        cursor
      }
    }
  }
"#;

pub const GET_CLIENT_SESSION: &str = r#"
  query GetClientSession($customerId: Int!, $macAddress: String!) {
    getClientSession(customerId: $customerId, macAddress: $macAddress) {
      id
      macAddress
      ipAddress
      hostname
      ssid
      radioType
      signal
      equipment {
        name
      }
      details
    }
  }
"#;
